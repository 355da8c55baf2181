//! Chart colors.
//!
//! Each data point gets a translucent RGBA color derived from its label, so a
//! category keeps the same slice color across refreshes. `Palette::Shuffled`
//! mixes a seed in for callers that want a new set of colors per refresh.

use std::fmt;

use serde::{Serialize, Serializer};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Alpha channel used for every series color.
pub const SERIES_ALPHA: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Palette {
    /// Same label, same color, every time.
    #[default]
    Stable,
    /// Colors depend on the seed as well as the label.
    Shuffled(u64),
}

/// Color for one data point of a series.
#[must_use]
pub fn series_color(label: &str, palette: Palette) -> Rgba {
    let seed = match palette {
        Palette::Stable => 0,
        Palette::Shuffled(seed) => seed,
    };
    let hash = fnv1a(seed.to_le_bytes().iter().chain(label.as_bytes()));
    let [r, g, b, ..] = hash.to_le_bytes();
    Rgba {
        r,
        g,
        b,
        a: SERIES_ALPHA,
    }
}

/// Colors for each label, in order.
#[must_use]
pub fn series_colors<'a, I>(labels: I, palette: Palette) -> Vec<Rgba>
where
    I: IntoIterator<Item = &'a String>,
{
    labels
        .into_iter()
        .map(|label| series_color(label, palette))
        .collect()
}

fn fnv1a<'a>(bytes: impl Iterator<Item = &'a u8>) -> u64 {
    bytes.fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_palette_repeats_colors() {
        let first = series_color("Food", Palette::Stable);
        let second = series_color("Food", Palette::Stable);
        assert_eq!(first, second);
        assert_ne!(first, series_color("Rent", Palette::Stable));
    }

    #[test]
    fn shuffled_palette_depends_on_seed() {
        let a = series_color("Food", Palette::Shuffled(1));
        let b = series_color("Food", Palette::Shuffled(2));
        assert_ne!(a, b);
        assert_eq!(a, series_color("Food", Palette::Shuffled(1)));
    }

    #[test]
    fn renders_as_css_rgba() {
        let color = Rgba {
            r: 10,
            g: 20,
            b: 30,
            a: SERIES_ALPHA,
        };
        assert_eq!(color.to_string(), "rgba(10, 20, 30, 0.5)");
        assert_eq!(
            serde_json::to_string(&color).unwrap(),
            "\"rgba(10, 20, 30, 0.5)\""
        );
    }
}
