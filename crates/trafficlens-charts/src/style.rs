//! Fixed palettes and color helpers shared by the chart renderers.

use plotters::style::RGBColor;

pub const GOOGLE_BLUE: RGBColor = RGBColor(0x42, 0x85, 0xF4);
pub const GOOGLE_RED: RGBColor = RGBColor(0xEA, 0x43, 0x35);
pub const GOOGLE_YELLOW: RGBColor = RGBColor(0xFB, 0xBC, 0x05);
pub const GOOGLE_GREEN: RGBColor = RGBColor(0x34, 0xA8, 0x53);

pub const BRAND_NAVY: RGBColor = RGBColor(0x00, 0x13, 0x30);
pub const BRAND_RED: RGBColor = RGBColor(0xE6, 0x47, 0x5F);
pub const BRAND_BLUE: RGBColor = RGBColor(0x1A, 0x2C, 0x5A);
pub const BRAND_LIGHT_BLUE: RGBColor = RGBColor(0xAD, 0xC0, 0xED);

pub const TITLE_FONT: (&str, u32) = ("sans-serif", 28);
pub const AXIS_FONT: (&str, u32) = ("sans-serif", 16);
pub const LEGEND_FONT: (&str, u32) = ("sans-serif", 18);

/// The four-color palette used by the channel and keyword charts, cycled when
/// there are more series than colors.
pub fn google_palette() -> Vec<RGBColor> {
    vec![GOOGLE_BLUE, GOOGLE_RED, GOOGLE_YELLOW, GOOGLE_GREEN]
}

/// Palette for the Helium time-series charts.
pub fn helium_palette() -> Vec<RGBColor> {
    vec![BRAND_NAVY, BRAND_RED, BRAND_BLUE, BRAND_LIGHT_BLUE]
}

pub fn series_color(palette: &[RGBColor], index: usize) -> RGBColor {
    if palette.is_empty() {
        return RGBColor(0, 0, 0);
    }
    palette[index % palette.len()]
}

/// Parse a `#RRGGBB` hex string. Falls back to black on malformed input.
pub fn parse_color(color_str: &str) -> RGBColor {
    if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }
    RGBColor(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#FF0000"), RGBColor(255, 0, 0));
        assert_eq!(parse_color("#4285F4"), GOOGLE_BLUE);
        assert_eq!(parse_color("not-a-color"), RGBColor(0, 0, 0));
        assert_eq!(parse_color("#ZZ0000"), RGBColor(0, 0, 0));
    }

    #[test]
    fn palette_cycles_past_its_length() {
        let palette = google_palette();
        assert_eq!(series_color(&palette, 0), GOOGLE_BLUE);
        assert_eq!(series_color(&palette, 4), GOOGLE_BLUE);
        assert_eq!(series_color(&palette, 5), GOOGLE_RED);
    }

    #[test]
    fn empty_palette_falls_back_to_black() {
        assert_eq!(series_color(&[], 3), RGBColor(0, 0, 0));
    }
}
