//! Entity kinds and color types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of scene entity that can carry components
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Node,
    Bone,
    Material,
    Scene,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [Self::Node, Self::Bone, Self::Material, Self::Scene];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Bone => "bone",
            Self::Material => "material",
            Self::Scene => "scene",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" | "object" => Some(Self::Node),
            "bone" => Some(Self::Bone),
            "material" => Some(Self::Material),
            "scene" => Some(Self::Scene),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transfer function an in-memory color uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Linear,
    Gamma,
}

/// RGBA color with channels in 0..=1
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Build from a vector of 3 or 4 channels; a missing alpha is opaque
    pub fn from_slice(channels: &[f64]) -> Option<Self> {
        match channels {
            [r, g, b] => Some(Self::new(*r, *g, *b, 1.0)),
            [r, g, b, a] => Some(Self::new(*r, *g, *b, *a)),
            _ => None,
        }
    }

    /// Channels as a vector of the requested length (3 drops alpha)
    pub fn to_vec(&self, size: usize) -> Vec<f64> {
        let all = [self.r, self.g, self.b, self.a];
        all[..size.min(4)].to_vec()
    }

    pub fn to_srgb(&self) -> Self {
        Self::new(
            linear_to_srgb(self.r),
            linear_to_srgb(self.g),
            linear_to_srgb(self.b),
            self.a,
        )
    }

    pub fn to_linear(&self) -> Self {
        Self::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
            self.a,
        )
    }

    /// `#rrggbb`, rounding each channel to 8 bits. Alpha is not written.
    pub fn to_hex(&self) -> String {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// Parse `#rrggbb` or `rrggbb` (case-insensitive); alpha is 1.0
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let raw = u32::from_str_radix(digits, 16).ok()?;
        let channel = |shift: u32| ((raw >> shift) & 0xFF) as f64 / 255.0;
        Some(Self::new(channel(16), channel(8), channel(0), 1.0))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(EntityKind::parse("bone"), Some(EntityKind::Bone));
        assert_eq!(EntityKind::parse("object"), Some(EntityKind::Node));
        assert_eq!(EntityKind::parse("mesh"), None);
        assert_eq!(EntityKind::Material.to_string(), "material");
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Color::from_hex("#FF8844").unwrap();
        assert!((c.r - 1.0).abs() < 1e-9);
        assert!((c.g - 136.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.to_hex(), "#ff8844");
        assert!(Color::from_hex("ff8844").is_some());
        assert!(Color::from_hex("#ff88").is_none());
        assert!(Color::from_hex("#gg8844").is_none());
    }

    #[test]
    fn test_transfer_functions_invert() {
        for c in [0.0, 0.002, 0.2, 0.5, 0.9, 1.0] {
            assert!((srgb_to_linear(linear_to_srgb(c)) - c).abs() < 1e-9);
        }
    }

    #[test]
    fn test_from_slice() {
        assert_eq!(
            Color::from_slice(&[0.1, 0.2, 0.3]),
            Some(Color::new(0.1, 0.2, 0.3, 1.0))
        );
        assert!(Color::from_slice(&[0.1]).is_none());
        assert_eq!(Color::new(0.1, 0.2, 0.3, 0.4).to_vec(3), vec![0.1, 0.2, 0.3]);
    }
}
