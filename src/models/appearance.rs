//! Appearance settings for a printed QR code.
//!
//! These are presentation-only values stored alongside each QR record as JSONB.
//! Missing fields fall back to defaults; everything is validated before a
//! record is written.

use serde::{Deserialize, Serialize};

const MIN_SIZE_PX: u32 = 128;
const MAX_SIZE_PX: u32 = 2048;
const MAX_LABEL_LEN: usize = 64;

/// Reed-Solomon error correction level of the rendered code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

/// Visual template used when rendering modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    #[default]
    Classic,
    Rounded,
    Dots,
}

/// Appearance of a QR code.
///
/// # JSON Example
///
/// ```json
/// {
///   "foreground": "#1a1a1a",
///   "background": "#ffffff",
///   "size_px": 512,
///   "error_correction": "quartile",
///   "template": "rounded",
///   "label": "Scan to verify"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrAppearance {
    pub foreground: String,
    pub background: String,
    pub size_px: u32,
    pub error_correction: ErrorCorrection,
    pub template: Template,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for QrAppearance {
    fn default() -> Self {
        Self {
            foreground: "#000000".to_string(),
            background: "#ffffff".to_string(),
            size_px: 512,
            error_correction: ErrorCorrection::default(),
            template: Template::default(),
            label: None,
        }
    }
}

impl QrAppearance {
    /// Validate colors, size and label, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if !is_hex_color(&self.foreground) {
            return Err(format!("foreground must be #rrggbb, got {}", self.foreground));
        }
        if !is_hex_color(&self.background) {
            return Err(format!("background must be #rrggbb, got {}", self.background));
        }
        if self.foreground.eq_ignore_ascii_case(&self.background) {
            return Err("foreground and background must differ".to_string());
        }
        if !(MIN_SIZE_PX..=MAX_SIZE_PX).contains(&self.size_px) {
            return Err(format!(
                "size_px must be between {MIN_SIZE_PX} and {MAX_SIZE_PX}"
            ));
        }
        if let Some(label) = &self.label {
            if label.chars().count() > MAX_LABEL_LEN {
                return Err(format!("label exceeds {MAX_LABEL_LEN} characters"));
            }
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
