//! Fixed layer color palette.

use std::fmt;

/// Number of palette entries.
pub const PALETTE_SIZE: usize = 10;

/// A named palette color.
///
/// `kml` is the 8-hex-digit `AABBGGRR` value KML expects, which is the
/// reverse channel order of the usual `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub kml: &'static str,
}

impl PaletteColor {
    /// Decode the `AABBGGRR` value into an `(r, g, b)` triple.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |range: std::ops::Range<usize>| {
            self.kml
                .get(range)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .unwrap_or(0)
        };
        (channel(6..8), channel(4..6), channel(2..4))
    }

    /// Look up a palette entry by name, ignoring case.
    pub fn by_name(name: &str) -> Option<(usize, &'static PaletteColor)> {
        PALETTE
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PaletteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Colors in assignment order.
pub static PALETTE: [PaletteColor; PALETTE_SIZE] = [
    PaletteColor { name: "Red", kml: "ff0000ff" },
    PaletteColor { name: "Blue", kml: "ffff0000" },
    PaletteColor { name: "Green", kml: "ff00aa00" },
    PaletteColor { name: "Yellow", kml: "ff00ffff" },
    PaletteColor { name: "Cyan", kml: "ffffff00" },
    PaletteColor { name: "Purple", kml: "ffaa00aa" },
    PaletteColor { name: "Orange", kml: "ff0066ff" },
    PaletteColor { name: "White", kml: "ffffffff" },
    PaletteColor { name: "Pink", kml: "ffaa44ff" },
    PaletteColor { name: "Lime", kml: "ff00ff88" },
];

/// Palette entry for an index, wrapping around.
pub fn color(index: usize) -> &'static PaletteColor {
    &PALETTE[index % PALETTE_SIZE]
}
