//! Colour conversions for hex colours given in sRGB

/// Converts one sRGB-encoded channel in [0, 1] to linear
pub fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Splits 0xRRGGBB into linear RGB
pub fn srgb_hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

/// Clear colour for an sRGB render target, which expects linear values
pub fn clear_color(hex: u32) -> wgpu::Color {
    let [r, g, b] = srgb_hex_to_linear(hex);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_extremes_and_mid_grey() {
        assert_eq!(srgb_hex_to_linear(0x000000), [0.0, 0.0, 0.0]);
        assert!(srgb_hex_to_linear(0xffffff)
            .iter()
            .all(|c| (c - 1.0).abs() < 1e-6));

        let [r, g, b] = srgb_hex_to_linear(0xa3a3a3);
        assert!((r - 0.366).abs() < 1e-3);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn channels_are_split_in_order() {
        let [r, g, b] = srgb_hex_to_linear(0xff0000);
        assert!((r - 1.0).abs() < 1e-6);
        assert_eq!((g, b), (0.0, 0.0));
    }
}
