use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Series palette
// ---------------------------------------------------------------------------

/// `n` visually distinct colours with evenly spaced hues, one per chart series.
pub fn series_palette(n: usize) -> Vec<Color32> {
    (0..n).map(|i| series_color(i, n)).collect()
}

/// Colour of series `i` out of `n`. Starts at a blue hue so a single series
/// does not come out red, which the UI reserves for errors.
pub fn series_color(i: usize, n: usize) -> Color32 {
    let n = n.max(1);
    let hue = 210.0 + (i as f32 / n as f32) * 360.0;
    let hsl = Hsl::new(hue % 360.0, 0.65, 0.55);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0).round() as u8,
        (rgb.green * 255.0).round() as u8,
        (rgb.blue * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let colours = series_palette(4);
        assert_eq!(colours.len(), 4);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(series_palette(0).is_empty());
    }
}
