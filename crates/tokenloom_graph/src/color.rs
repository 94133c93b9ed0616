// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color math for the color nodes.
//!
//! Covers hex parsing/formatting, the fixed-weight channel mix used by
//! `MixColors`, and the color spaces the palette ramp can be sampled in:
//! - `rgb`: straight per-channel interpolation of sRGB bytes
//! - `hsl`: hue/saturation/lightness with shortest-arc hue
//! - `oklch`: polar OKLab, perceptually even lightness steps

use peniko::color::{AlphaColor, ColorSpaceTag, DynamicColor, HueDirection, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse a `#rrggbb` string into its three byte channels
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }

    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(channels)
}

/// Render three byte channels as lowercase `#rrggbb`
pub fn format_hex(channels: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", channels[0], channels[1], channels[2])
}

/// Mix two colors per channel: `floor(b + (a - b) * weight)`
pub fn mix_channels(a: [u8; 3], b: [u8; 3], weight: f64) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let (ca, cb) = (f64::from(a[i]), f64::from(b[i]));
        out[i] = (cb + (ca - cb) * weight).floor().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Color space used when sampling a ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Polar OKLab
    #[default]
    Oklch,
    /// sRGB channels
    Rgb,
    /// Hue, saturation, lightness
    Hsl,
}

impl ColorSpace {
    /// All selectable spaces
    pub const ALL: [ColorSpace; 3] = [ColorSpace::Oklch, ColorSpace::Rgb, ColorSpace::Hsl];

    /// Control value for this space
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorSpace::Oklch => "oklch",
            ColorSpace::Rgb => "rgb",
            ColorSpace::Hsl => "hsl",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|space| space.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown color space: {s}"))
    }
}

/// sRGB color with channels in `0.0..=255.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red
    pub r: f64,
    /// Green
    pub g: f64,
    /// Blue
    pub b: f64,
}

impl Rgb {
    /// Pure white
    pub const WHITE: Rgb = Rgb { r: 255.0, g: 255.0, b: 255.0 };
    /// Pure black
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    /// Build from byte channels
    pub fn from_bytes(channels: [u8; 3]) -> Self {
        Self {
            r: f64::from(channels[0]),
            g: f64::from(channels[1]),
            b: f64::from(channels[2]),
        }
    }

    /// Parse from `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        parse_hex(hex).map(Self::from_bytes)
    }

    /// Round half-up and clamp to byte channels
    pub fn to_bytes(self) -> [u8; 3] {
        let byte = |c: f64| (c + 0.5).floor().clamp(0.0, 255.0) as u8;
        [byte(self.r), byte(self.g), byte(self.b)]
    }

    /// Render as `#rrggbb`
    pub fn to_hex(self) -> String {
        format_hex(self.to_bytes())
    }
}

impl ColorSpace {
    fn tag(self) -> ColorSpaceTag {
        match self {
            ColorSpace::Oklch => ColorSpaceTag::Oklch,
            ColorSpace::Rgb => ColorSpaceTag::Srgb,
            ColorSpace::Hsl => ColorSpaceTag::Hsl,
        }
    }

    /// Component layout for the cylindrical spaces
    fn axes(self) -> Option<PolarAxes> {
        match self {
            ColorSpace::Rgb => None,
            ColorSpace::Hsl => Some(PolarAxes {
                lightness: 2,
                colorfulness: 1,
                hue: 0,
                achromatic_below: 1e-3,
                lightness_range: [0.0, 100.0],
                pin_colorfulness: true,
            }),
            ColorSpace::Oklch => Some(PolarAxes {
                lightness: 0,
                colorfulness: 1,
                hue: 2,
                achromatic_below: 1e-4,
                lightness_range: [0.0, 1.0],
                pin_colorfulness: false,
            }),
        }
    }
}

/// Where lightness, saturation/chroma and hue sit in a polar color's components
struct PolarAxes {
    lightness: usize,
    colorfulness: usize,
    hue: usize,
    /// Colorfulness below this has no meaningful hue
    achromatic_below: f32,
    lightness_range: [f32; 2],
    /// Hold saturation when an achromatic end is pure white or black
    pin_colorfulness: bool,
}

impl PolarAxes {
    fn is_achromatic(&self, color: &DynamicColor) -> bool {
        let hue = color.components[self.hue];
        hue.is_nan() || color.components[self.colorfulness].abs() < self.achromatic_below
    }

    fn is_extreme(&self, color: &DynamicColor) -> bool {
        let lightness = color.components[self.lightness];
        self.lightness_range
            .iter()
            .any(|bound| (lightness - bound).abs() < 1e-4)
    }

    /// Give an achromatic endpoint the hue of the other one
    fn borrow_hue(&self, achromatic: &mut DynamicColor, other: &DynamicColor) {
        achromatic.components[self.hue] = other.components[self.hue];
        if self.pin_colorfulness && self.is_extreme(achromatic) {
            achromatic.components[self.colorfulness] = other.components[self.colorfulness];
        }
    }

    fn align_hues(&self, from: &mut DynamicColor, to: &mut DynamicColor) {
        match (self.is_achromatic(from), self.is_achromatic(to)) {
            (true, false) => self.borrow_hue(from, to),
            (false, true) => self.borrow_hue(to, from),
            (true, true) => {
                from.components[self.hue] = 0.0;
                to.components[self.hue] = 0.0;
            }
            (false, false) => {}
        }
    }
}

impl Rgb {
    fn to_dynamic(self) -> DynamicColor {
        let unit = |c: f64| (c / 255.0) as f32;
        DynamicColor::from_alpha_color(AlphaColor::<Srgb>::new([
            unit(self.r),
            unit(self.g),
            unit(self.b),
            1.0,
        ]))
    }

    fn from_dynamic(color: DynamicColor) -> Self {
        let [r, g, b, _] = color.to_alpha_color::<Srgb>().components;
        Self {
            r: f64::from(r) * 255.0,
            g: f64::from(g) * 255.0,
            b: f64::from(b) * 255.0,
        }
    }
}

/// Interpolate between two colors in the given space, `f` in `0.0..=1.0`
///
/// Hue travels the shorter arc. An achromatic end takes the hue of the
/// other end so ramps to white or black keep their tint.
pub fn interpolate(from: Rgb, to: Rgb, f: f64, space: ColorSpace) -> Rgb {
    let tag = space.tag();
    let mut start = from.to_dynamic().convert(tag);
    let mut end = to.to_dynamic().convert(tag);
    if let Some(axes) = space.axes() {
        axes.align_hues(&mut start, &mut end);
    }

    let mixed = start
        .interpolate(end, tag, HueDirection::Shorter)
        .eval(f as f32);
    Rgb::from_dynamic(mixed)
}

/// Sample a piecewise scale over evenly spaced stops at `t` in `0.0..=1.0`
pub fn sample_scale(stops: &[Rgb], t: f64, space: ColorSpace) -> Rgb {
    match stops {
        [] => Rgb::BLACK,
        [only] => *only,
        _ => {
            let segments = (stops.len() - 1) as f64;
            let t = t.clamp(0.0, 1.0);
            // A position on a boundary belongs to the segment that ends there
            let index = ((t * segments).ceil() as usize).clamp(1, stops.len() - 1) - 1;
            let local = t * segments - index as f64;
            interpolate(stops[index], stops[index + 1], local, space)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_hex() {
        assert_eq!(parse_hex("#3b82f6"), Some([0x3b, 0x82, 0xf6]));
        assert_eq!(parse_hex("#3B82F6"), Some([0x3b, 0x82, 0xf6]));
        assert_eq!(parse_hex("3b82f6"), None);
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(format_hex([0, 10, 255]), "#000aff");
    }

    #[test]
    fn test_mix_floors_each_channel() {
        let mixed = mix_channels([255, 255, 255], [0, 0, 0], 0.5);
        assert_eq!(format_hex(mixed), "#7f7f7f");

        // floor(255 + (0 - 255) * 0.5) = floor(127.5)
        let reversed = mix_channels([0, 0, 0], [255, 255, 255], 0.5);
        assert_eq!(format_hex(reversed), "#7f7f7f");

        let mixed = mix_channels([0x3b, 0x82, 0xf6], [0xff, 0xff, 0xff], 0.5);
        assert_eq!(format_hex(mixed), "#9dc0fa");
    }

    #[test]
    fn test_color_space_parse() {
        assert_eq!("oklch".parse::<ColorSpace>(), Ok(ColorSpace::Oklch));
        assert_eq!("HSL".parse::<ColorSpace>(), Ok(ColorSpace::Hsl));
        assert!("lab".parse::<ColorSpace>().is_err());
    }

    #[test]
    fn test_interpolation_endpoints() {
        let base = Rgb::from_hex("#3b82f6").unwrap();
        for space in ColorSpace::ALL {
            assert_eq!(interpolate(Rgb::WHITE, base, 1.0, space).to_hex(), "#3b82f6");
            assert_eq!(interpolate(base, Rgb::BLACK, 1.0, space).to_hex(), "#000000");
            assert_eq!(interpolate(Rgb::WHITE, base, 0.0, space).to_hex(), "#ffffff");
        }
    }

    #[test]
    fn test_rgb_interpolation_rounds_half_up() {
        let base = Rgb::from_hex("#3b82f6").unwrap();
        // 255 * 0.8 + 59 * 0.2 = 215.8, 255 * 0.8 + 130 * 0.2 = 230, 255 * 0.8 + 246 * 0.2 = 253.2
        assert_eq!(interpolate(Rgb::WHITE, base, 0.2, ColorSpace::Rgb).to_hex(), "#d8e6fd");
    }

    #[test]
    fn test_hsl_hue_takes_shortest_arc() {
        let red = Rgb::from_hex("#ff0000").unwrap();
        let magenta = Rgb::from_hex("#ff00ff").unwrap();
        // 0deg -> 300deg goes backwards through 330deg, not forwards through 150deg
        let mid = interpolate(red, magenta, 0.5, ColorSpace::Hsl).to_bytes();
        assert_eq!(mid[0], 255);
        assert_eq!(mid[1], 0);
        assert!(mid[2] > 0);
    }

    #[test]
    fn test_ramp_to_white_keeps_hue() {
        let base = Rgb::from_hex("#3b82f6").unwrap();
        for space in [ColorSpace::Hsl, ColorSpace::Oklch] {
            let [r, g, b] = interpolate(Rgb::WHITE, base, 0.5, space).to_bytes();
            // Still a blue, not drifting through red
            assert!(b > g && g > r, "{space}: {r} {g} {b}");
        }
    }

    #[test]
    fn test_sample_scale_segments() {
        let base = Rgb::from_hex("#3b82f6").unwrap();
        let stops = [Rgb::WHITE, base, Rgb::BLACK];
        for space in ColorSpace::ALL {
            assert_eq!(sample_scale(&stops, 0.0, space).to_hex(), "#ffffff");
            assert_eq!(sample_scale(&stops, 0.5, space).to_hex(), "#3b82f6");
            assert_eq!(sample_scale(&stops, 1.0, space).to_hex(), "#000000");
        }
    }
}
