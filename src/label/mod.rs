//! Label rendering.
//!
//! Turns badge, wine and employee label requests into ZPL markup. Rendering
//! is pure: the same request always yields byte-identical markup.
//!
//! ## Layouts
//! ```text
//! badge                wine              employee
//! ^FO x,base          ^FO 50,50 #12     ^FO 50,30  organization
//! ^FO x,base+lh       ^FO 50,100 name   ^FO 50,80  employee name
//! ...wrapped name                       ^FO 50,130 function
//! ^FO x,base+n*lh #17
//! ```

mod wrap;
mod zpl;

use serde::{Deserialize, Serialize};

pub use wrap::wrap_text;
pub use zpl::{Font, ZplBuilder};

use crate::config::LabelConfig;

/// Organization line used on employee labels unless configured otherwise.
pub const DEFAULT_ORGANIZATION: &str = "STAFF";

const LEFT_MARGIN: u32 = 50;

/// Visitor badge layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeLayout {
    /// Small type, 25 characters per line. A one-line name gives the
    /// classic two-field badge: name at y=50, number at y=100.
    Compact,
    /// Large type, 20 characters per line, oversized badge number.
    #[default]
    Large,
}

struct BadgeMetrics {
    wrap_width: usize,
    base_y: u32,
    line_height: u32,
    text_font: Font,
    number_font: Font,
}

impl BadgeLayout {
    fn metrics(self) -> BadgeMetrics {
        match self {
            BadgeLayout::Compact => BadgeMetrics {
                wrap_width: 25,
                base_y: 50,
                line_height: 50,
                text_font: Font::new(36, 20),
                number_font: Font::new(36, 20),
            },
            BadgeLayout::Large => BadgeMetrics {
                wrap_width: 20,
                base_y: 40,
                line_height: 50,
                text_font: Font::new(40, 22),
                number_font: Font::new(72, 40),
            },
        }
    }
}

/// A label to render, as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LabelRequest {
    Badge { company_name: String, number: i64 },
    Wine { number: i64, name: String },
    Employee { name: String, function: String },
}

/// Renders labels with a fixed badge layout and organization line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRenderer {
    badge_layout: BadgeLayout,
    organization: String,
}

impl LabelRenderer {
    pub fn new(badge_layout: BadgeLayout, organization: impl Into<String>) -> Self {
        Self {
            badge_layout,
            organization: organization.into(),
        }
    }

    pub fn from_config(config: &LabelConfig) -> Self {
        Self::new(config.badge_layout, config.organization.clone())
    }

    pub fn badge_layout(&self) -> BadgeLayout {
        self.badge_layout
    }

    /// Visitor badge: wrapped company name with the badge number below it.
    pub fn badge_label(&self, company_name: &str, number: i64) -> String {
        let m = self.badge_layout.metrics();
        let lines = wrap_text(company_name, m.wrap_width);

        let mut zpl = ZplBuilder::new();
        let mut y = m.base_y;
        for line in &lines {
            zpl.field(LEFT_MARGIN, y, m.text_font, line);
            y += m.line_height;
        }
        zpl.field(LEFT_MARGIN, y, m.number_font, &format!("#{number}"));
        zpl.build()
    }

    /// Wine label: number above name, no wrapping.
    pub fn wine_label(&self, number: i64, name: &str) -> String {
        ZplBuilder::new()
            .field(LEFT_MARGIN, 50, Font::new(36, 20), &format!("#{number}"))
            .field(LEFT_MARGIN, 100, Font::new(24, 16), name)
            .build()
    }

    /// Employee label: organization, name and function, no wrapping.
    pub fn employee_label(&self, name: &str, function: &str) -> String {
        ZplBuilder::new()
            .field(LEFT_MARGIN, 30, Font::new(28, 16), &self.organization)
            .field(LEFT_MARGIN, 80, Font::new(36, 20), name)
            .field(LEFT_MARGIN, 130, Font::new(28, 16), function)
            .build()
    }

    pub fn render(&self, request: &LabelRequest) -> String {
        match request {
            LabelRequest::Badge {
                company_name,
                number,
            } => self.badge_label(company_name, *number),
            LabelRequest::Wine { number, name } => self.wine_label(*number, name),
            LabelRequest::Employee { name, function } => self.employee_label(name, function),
        }
    }
}

impl Default for LabelRenderer {
    fn default() -> Self {
        Self::new(BadgeLayout::default(), DEFAULT_ORGANIZATION)
    }
}

/// Visitor badge in the default layout.
pub fn render_badge_label(company_name: &str, number: i64) -> String {
    LabelRenderer::default().badge_label(company_name, number)
}

pub fn render_wine_label(number: i64, name: &str) -> String {
    LabelRenderer::default().wine_label(number, name)
}

/// Employee label with the default organization line.
pub fn render_employee_label(name: &str, function: &str) -> String {
    LabelRenderer::default().employee_label(name, function)
}
