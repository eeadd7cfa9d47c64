//! Fixed color and naming conventions for the Danish generation mix.
//!
//! One registry keyed by the API's technology column names; rendering code
//! looks everything up here instead of carrying its own literals.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use plotters::style::RGBColor;

/// Column carrying total system load, drawn as the consumption overlay.
pub const TOTAL_LOAD: &str = "TotalLoad";

/// Display name for the consumption overlay.
pub const LOAD_DISPLAY_NAME: &str = "Forbrug";

/// Fallback for series without a registered technology entry.
pub const DEFAULT_SERIES_COLOR: RGBColor = RGBColor(0xCC, 0xCC, 0xCC);

/// Fixed color and Danish display name for one generation technology.
#[derive(Debug, Clone, Copy)]
pub struct Technology {
    pub color: RGBColor,
    pub display_name: &'static str,
}

static TECHNOLOGIES: Lazy<HashMap<&'static str, Technology>> = Lazy::new(|| {
    HashMap::from([
        (
            "SolarPower",
            Technology {
                color: RGBColor(0xFD, 0xB8, 0x13),
                display_name: "Sol",
            },
        ),
        (
            "OnshoreWindPower",
            Technology {
                color: RGBColor(0x00, 0xA0, 0xDC),
                display_name: "Landvind",
            },
        ),
        (
            "OffshoreWindPower",
            Technology {
                color: RGBColor(0x2E, 0x8B, 0x57),
                display_name: "Havvind",
            },
        ),
        (
            "FossilGas",
            Technology {
                color: RGBColor(0xFF, 0x7F, 0x50),
                display_name: "Gas",
            },
        ),
        (
            "FossilHardCoal",
            Technology {
                color: RGBColor(0x80, 0x80, 0x80),
                display_name: "Kul",
            },
        ),
        (
            "Biomass",
            Technology {
                color: RGBColor(0x90, 0xEE, 0x90),
                display_name: "Biomasse",
            },
        ),
        (
            "FossilOil",
            Technology {
                color: RGBColor(0x8B, 0x45, 0x13),
                display_name: "Olie",
            },
        ),
        (
            "Waste",
            Technology {
                color: RGBColor(0x8B, 0x00, 0x00),
                display_name: "Affald",
            },
        ),
    ])
});

pub fn technology(column: &str) -> Option<&'static Technology> {
    TECHNOLOGIES.get(column)
}

/// Color for a stacked series; unknown columns get the neutral fallback
/// rather than an error.
pub fn series_color(column: &str) -> RGBColor {
    technology(column).map(|t| t.color).unwrap_or(DEFAULT_SERIES_COLOR)
}

/// Display name for a series: the Danish name when registered, else the raw
/// column name.
pub fn series_name(column: &str) -> &str {
    technology(column).map(|t| t.display_name).unwrap_or(column)
}
