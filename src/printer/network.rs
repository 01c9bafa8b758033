//! Raw TCP label printer (port 9100)

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument};

use super::error::{PrintError, PrintResult};
use super::LabelPrinter;

/// Raw printing port used by Zebra and most network label printers.
pub const DEFAULT_PORT: u16 = 9100;

/// Network label printer
///
/// Device handles are `host` or `host:port`; the port defaults to 9100.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Normalize a device handle into a connectable `host:port` string
    pub fn address(device: &str) -> PrintResult<String> {
        let device = device.trim();
        if device.is_empty() {
            return Err(PrintError::InvalidConfig("empty device handle".to_string()));
        }

        match device.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() || port.parse::<u16>().is_err() {
                    return Err(PrintError::InvalidConfig(format!(
                        "Invalid address: {}",
                        device
                    )));
                }
                Ok(device.to_string())
            }
            None => Ok(format!("{}:{}", device, DEFAULT_PORT)),
        }
    }

    async fn connect(&self, addr: &str) -> PrintResult<TcpStream> {
        tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", addr, e)))
    }
}

impl Default for NetworkPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelPrinter for NetworkPrinter {
    #[instrument(skip(self, markup), fields(markup_len = markup.len()))]
    async fn send(&self, device: &str, markup: &str) -> PrintResult<()> {
        let addr = Self::address(device)?;
        let mut stream = self.connect(&addr).await?;

        stream.write_all(markup.as_bytes()).await?;
        stream.flush().await?;
        stream.shutdown().await?;

        info!(%addr, "Label sent");
        Ok(())
    }
}
