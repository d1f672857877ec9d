use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            to_color32(hsl.into_color())
        })
        .collect()
}

/// Five shades from dark red (1 star) to gold (5 stars).
pub fn star_color(stars: u8) -> Color32 {
    let t = (stars.clamp(1, 5) - 1) as f32 / 4.0;
    let hsl = Hsl::new(50.0 * t, 0.9, 0.3 + 0.25 * t);
    to_color32(hsl.into_color())
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: genre → Color32
// ---------------------------------------------------------------------------

/// Maps genre labels to distinct colours so a genre keeps its colour across
/// every chart.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the distinct genres of a table.
    pub fn new(genres: &BTreeSet<String>) -> Self {
        let palette = generate_palette(genres.len());
        let mapping: BTreeMap<String, Color32> = genres
            .iter()
            .zip(palette)
            .map(|(g, c)| (g.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }

    /// Look up the colour for a genre.
    pub fn color_for(&self, genre: &str) -> Color32 {
        self.mapping
            .get(genre)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let p = generate_palette(6);
        assert_eq!(p.len(), 6);
        let unique: BTreeSet<[u8; 4]> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 6);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_genres_fall_back_to_default() {
        let genres: BTreeSet<String> = ["Mystery", "Romance"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = ColorMap::new(&genres);
        assert_ne!(map.color_for("Mystery"), map.color_for("Romance"));
        assert_eq!(map.color_for("Poetry"), Color32::LIGHT_BLUE);
    }
}
