//! Label printer delivery.
//!
//! The device channel that accepts rendered markup and a device handle and
//! resolves once the printer took the job. The ledger never calls into this
//! module; callers print first and record afterwards.

mod error;
mod network;

pub use error::{PrintError, PrintResult};
pub use network::{NetworkPrinter, DEFAULT_PORT};

/// Trait for label printer adapters
#[allow(async_fn_in_trait)]
pub trait LabelPrinter {
    /// Send rendered markup to the device identified by `device`
    async fn send(&self, device: &str, markup: &str) -> PrintResult<()>;
}
