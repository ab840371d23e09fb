pub mod polygon;
pub mod resolver;
pub mod zones;

use regex::Regex;
use std::sync::LazyLock;

pub use resolver::{GroupTarget, ZoneResolver, ZoneTargets, DEFAULT_CENTRAL_ZONE};

static LOCATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*$").expect("location pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parses the free-text `"lat,lng"` form complaints carry.
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = LOCATION_PATTERN.captures(raw)?;
        let lat = captures.get(1)?.as_str().parse().ok()?;
        let lng = captures.get(2)?.as_str().parse().ok()?;
        Some(Self { lat, lng })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_spaced_pairs() {
        assert_eq!(LatLng::parse("13.75,100.50"), Some(LatLng::new(13.75, 100.5)));
        assert_eq!(LatLng::parse(" -6.2 , 106.8 "), Some(LatLng::new(-6.2, 106.8)));
        assert_eq!(LatLng::parse("14,101"), Some(LatLng::new(14.0, 101.0)));
    }

    #[test]
    fn rejects_malformed_locations() {
        for raw in ["", "13.75", "13.75;100.5", "abc,100", "13.75,100.5,7", "1e3,2"] {
            assert_eq!(LatLng::parse(raw), None, "{raw:?} should not parse");
        }
    }
}
