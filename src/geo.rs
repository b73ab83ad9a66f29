use serde::{Deserialize, Serialize};

const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Rectangular service area, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Region {
    /// Approximate San Francisco bounds.
    pub const SAN_FRANCISCO: Region = Region {
        north: 37.8324,
        south: 37.6398,
        east: -122.2818,
        west: -122.5173,
    };

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }

    pub fn center(&self) -> Location {
        Location {
            lat: (self.north + self.south) / 2.0,
            lng: (self.east + self.west) / 2.0,
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::SAN_FRANCISCO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_to(&self, lat: f64, lng: f64) -> f64 {
        distance_miles(self.lat, self.lng, lat, lng)
    }
}

/// Great-circle distance in miles using the Haversine formula
pub fn distance_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_contains() {
        let sf = Region::SAN_FRANCISCO;
        assert!(sf.contains(37.7749, -122.4194)); // Civic Center
        assert!(sf.contains(37.8324, -122.5173)); // corner is inclusive
        assert!(!sf.contains(37.8044, -122.2712)); // Oakland
        assert!(!sf.contains(37.3382, -121.8863)); // San Jose
    }

    #[test]
    fn test_custom_region() {
        let region = Region {
            north: 1.0,
            south: -1.0,
            east: 1.0,
            west: -1.0,
        };
        assert!(region.contains(0.0, 0.0));
        assert!(!region.contains(1.5, 0.0));
        assert_eq!(region.center(), Location::new(0.0, 0.0));
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = (37.7749, -122.4194);
        let b = (37.7599, -122.4148);
        let ab = distance_miles(a.0, a.1, b.0, b.1);
        let ba = distance_miles(b.0, b.1, a.0, a.1);
        assert!((ab - ba).abs() < 1e-12);
        assert_eq!(distance_miles(a.0, a.1, a.0, a.1), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        // Ferry Building to Ocean Beach, a bit under 7 miles
        let d = distance_miles(37.7955, -122.3937, 37.7594, -122.5107);
        assert!((d - 6.8).abs() < 0.6, "got {}", d);

        // One degree of latitude is ~69.1 miles
        let d = distance_miles(37.0, -122.0, 38.0, -122.0);
        assert!((d - 69.1).abs() < 0.2);
    }
}
