//! Geographic coordinates produced by the geocoder and consumed by the router

use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as the `lat,lon` pair routing APIs expect
    #[must_use]
    pub fn to_query_point(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Format coordinates for log output
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_point() {
        let point = Coordinates::new(51.5072, -0.1276);
        assert_eq!(point.to_query_point(), "51.5072,-0.1276");
    }

    #[test]
    fn test_format_coordinates() {
        let point = Coordinates::new(46.818_234, 8.227_456);
        assert_eq!(point.format_coordinates(), "46.8182, 8.2275");
    }
}
