//! ARGB colors and the packed-integer wire convention.
//!
//! In memory a color is four independent 8-bit channels. On the wire it is
//! a single 32-bit integer laid out as `0xAARRGGBB`. Only the property keys
//! in [`COLOR_PROPERTY_KEYS`] carry colors inside a property bag.

use serde::{Deserialize, Serialize};

/// Property keys whose integer values are colors.
pub const COLOR_PROPERTY_KEYS: &[&str] = &[
    "color",
    "backgroundColor",
    "textColor",
    "borderColor",
    "strokeColor",
    "fillColor",
];

/// Check if a property key holds a color.
#[must_use]
pub fn is_color_property(key: &str) -> bool {
    COLOR_PROPERTY_KEYS.contains(&key)
}

/// An 8-bit-per-channel ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "i64")]
pub struct Color {
    /// Alpha channel (0 = transparent, 255 = opaque).
    pub a: u8,
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::from_argb(0xFF, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::from_argb(0xFF, 0xFF, 0xFF, 0xFF);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_argb(0, 0, 0, 0);

    /// Create a color from its channels.
    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Unpack a `0xAARRGGBB` integer.
    #[must_use]
    pub const fn from_packed(value: u32) -> Self {
        let [a, r, g, b] = value.to_be_bytes();
        Self { a, r, g, b }
    }

    /// Pack into a `0xAARRGGBB` integer.
    #[must_use]
    pub const fn to_packed(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Interpret a wire integer as a packed color.
    ///
    /// Accepts the unsigned form (`0..=0xFFFF_FFFF`) and the signed 32-bit
    /// form some JavaScript writers emit for opaque colors. Returns `None`
    /// for anything wider than 32 bits.
    #[must_use]
    pub fn from_wire_int(value: i64) -> Option<Self> {
        if let Ok(unsigned) = u32::try_from(value) {
            return Some(Self::from_packed(unsigned));
        }
        i32::try_from(value)
            .ok()
            .map(|signed| Self::from_packed(u32::from_be_bytes(signed.to_be_bytes())))
    }

    /// Multiply the alpha channel by `opacity` (clamped to `[0, 1]`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (f64::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }

    /// Alpha as a fraction in `[0, 1]`.
    #[must_use]
    pub fn alpha_fraction(self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// CSS `rgba()` notation.
    #[must_use]
    pub fn to_css(self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            self.alpha_fraction()
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_packed()
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Self::from_packed(value)
    }
}

impl TryFrom<i64> for Color {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_wire_int(value).ok_or_else(|| format!("{value} is not a 32-bit packed color"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_packing_layout() {
        let color = Color::from_argb(0xFF, 0x21, 0x96, 0xF3);
        assert_eq!(color.to_packed(), 0xFF21_96F3);
        assert_eq!(Color::from_packed(0xFF21_96F3), color);
    }

    #[test]
    fn test_signed_wire_form() {
        // 0xFF000000 as a signed 32-bit integer.
        assert_eq!(Color::from_wire_int(-16_777_216), Some(Color::BLACK));
        assert_eq!(Color::from_wire_int(0xFFFF_FFFF), Some(Color::WHITE));
        assert_eq!(Color::from_wire_int(1 << 40), None);
    }

    #[test]
    fn test_serde_uses_packed_integer() {
        let json = serde_json::to_string(&Color::WHITE).expect("serialize");
        assert_eq!(json, "4294967295");
        let back: Color = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Color::WHITE);
        assert!(serde_json::from_str::<Color>("1099511627776").is_err());
    }

    #[test]
    fn test_with_opacity_multiplies_own_alpha() {
        let half = Color::from_argb(128, 10, 20, 30).with_opacity(0.5);
        assert_eq!(half.a, 64);
        assert_eq!((half.r, half.g, half.b), (10, 20, 30));
        assert_eq!(Color::WHITE.with_opacity(0.0).a, 0);
    }

    #[test]
    fn test_allowlist() {
        assert!(is_color_property("backgroundColor"));
        assert!(is_color_property("fillColor"));
        assert!(!is_color_property("fontSize"));
        assert!(!is_color_property("Color"));
    }

    #[test]
    fn test_css() {
        assert_eq!(Color::from_argb(255, 1, 2, 3).to_css(), "rgba(1,2,3,1.000)");
    }

    proptest! {
        #[test]
        fn prop_unpack_pack_identity(a in any::<u8>(), r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let color = Color::from_argb(a, r, g, b);
            prop_assert_eq!(Color::from_packed(color.to_packed()), color);
        }

        #[test]
        fn prop_pack_unpack_identity(value in any::<u32>()) {
            prop_assert_eq!(Color::from_packed(value).to_packed(), value);
        }
    }
}
