//! ZPL command builder
//!
//! Provides a fluent API for building label markup out of positioned text
//! fields.

use std::fmt::Write;

/// Scalable size of the built-in `D` font, in dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub height: u32,
    pub width: u32,
}

impl Font {
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

/// ZPL label builder
///
/// Every field is written as `^FO{x},{y}^ADN,{h},{w}^FD{text}^FS` on its own
/// line between the `^XA` and `^XZ` label delimiters.
pub struct ZplBuilder {
    buf: String,
}

impl ZplBuilder {
    /// Start a new label (`^XA`)
    pub fn new() -> Self {
        let mut buf = String::with_capacity(256);
        buf.push_str("^XA");
        Self { buf }
    }

    /// Add a text field with its origin at (`x`, `y`)
    ///
    /// Text containing ZPL control characters is hex-escaped through `^FH`.
    pub fn field(&mut self, x: u32, y: u32, font: Font, text: &str) -> &mut Self {
        let _ = write!(
            self.buf,
            "\n^FO{},{}^ADN,{},{}",
            x, y, font.height, font.width
        );
        if needs_escape(text) {
            self.buf.push_str("^FH_^FD");
            self.buf.push_str(&escape_field(text));
        } else {
            self.buf.push_str("^FD");
            self.buf.push_str(text);
        }
        self.buf.push_str("^FS");
        self
    }

    /// Finish the label (`^XZ`) and return the markup
    pub fn build(&mut self) -> String {
        let mut out = std::mem::take(&mut self.buf);
        out.push_str("\n^XZ");
        out
    }
}

impl Default for ZplBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn needs_escape(text: &str) -> bool {
    text.contains(['^', '~', '_'])
}

/// Hex-escape `^`, `~` and the `_` escape indicator itself.
fn escape_field(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '^' | '~' | '_' => {
                let _ = write!(out, "_{:02X}", c as u32);
            }
            _ => out.push(c),
        }
    }
    out
}
