//! Color utility functions for background animations.

use backdrop_core::ThemeColor;

/// Convert HSL (hue in degrees, saturation and lightness in 0.0-1.0) to RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> ThemeColor {
    if s == 0.0 {
        let v = (l * 255.0) as u8;
        return ThemeColor::new(v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    let h = (h / 360.0).rem_euclid(1.0);

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    let channel = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    ThemeColor::new(channel(r), channel(g), channel(b))
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), ThemeColor::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), ThemeColor::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), ThemeColor::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), ThemeColor::new(255, 0, 0));
    }

    #[test]
    fn test_grey_when_unsaturated() {
        assert_eq!(hsl_to_rgb(200.0, 0.0, 0.5), ThemeColor::new(127, 127, 127));
    }
}
