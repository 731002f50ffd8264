//! Hex colors with WCAG relative luminance and contrast ratio.
//!
//! Trace consumers use these to pick readable label colors for node kinds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` or `#rgb`; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => Some(Rgb {
                r: u8::from_str_radix(&digits[0..2], 16).ok()?,
                g: u8::from_str_radix(&digits[2..4], 16).ok()?,
                b: u8::from_str_radix(&digits[4..6], 16).ok()?,
            }),
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Rgb {
                    r: nibble(0)?,
                    g: nibble(1)?,
                    b: nibble(2)?,
                })
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Relative luminance in `[0, 1]` (sRGB, WCAG 2.x coefficients).
    pub fn luminance(&self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = channel as f64 / 255.0;
            if c <= 0.03928 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
        }
        let l = 0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b);
        l.clamp(0.0, 1.0)
    }
}

/// Luminance of a hex color string, `None` if it does not parse.
pub fn luminance(hex: &str) -> Option<f64> {
    Rgb::from_hex(hex).map(|c| c.luminance())
}

/// WCAG contrast ratio in `[1, 21]`, independent of argument order.
pub fn contrast(a: &str, b: &str) -> Option<f64> {
    let la = luminance(a)?;
    let lb = luminance(b)?;
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    Some((hi + 0.05) / (lo + 0.05))
}
