//! Geolocation attached to a photo or video.

use serde::Serialize;
use std::fmt;

/// Where a content item was captured.
///
/// Metadata readers report `(0.0, 0.0)` when a file carries no GPS block, so
/// that exact pair is kept as its own variant instead of being trusted as a
/// point on the equator.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    Known { lat: f64, lng: f64 },
    Unknown,
    ZeroSentinel,
}

impl Location {
    /// Classify a raw coordinate pair read from file metadata.
    pub fn from_coordinates(lat: f64, lng: f64) -> Self {
        if lat == 0.0 && lng == 0.0 {
            Location::ZeroSentinel
        } else {
            Location::Known { lat, lng }
        }
    }

    /// Whether this location should be shown to a viewer.
    pub fn is_valid(&self) -> bool {
        matches!(self, Location::Known { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Known { lat, lng } => write!(f, "({:.5}, {:.5})", lat, lng),
            Location::Unknown | Location::ZeroSentinel => write!(f, "(unknown)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_pair_is_sentinel_not_coordinate() {
        let loc = Location::from_coordinates(0.0, 0.0);
        assert_eq!(loc, Location::ZeroSentinel);
        assert!(!loc.is_valid());
    }

    #[test]
    fn single_zero_axis_is_still_a_real_point() {
        let loc = Location::from_coordinates(0.0, 12.5);
        assert!(loc.is_valid());
        assert_eq!(loc.to_string(), "(0.00000, 12.50000)");
    }
}
