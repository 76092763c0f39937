//! Tunemap - music social network backend
//!
//! Users register, report a location and share the tracks they listen to.
//! The core of the service is proximity search: finding every user within a
//! radius of a coordinate using the haversine great-circle distance.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_bounding_box, find_nearby, haversine_distance, NearbyResult, ProximityEngine};
pub use models::{Coordinate, MusicPreference, NearbyQuery, User};
pub use services::{NearbyService, UserStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bbox = calculate_bounding_box(Coordinate::new(40.7128, -74.0060), 10.0);
        assert!(bbox.min_lat < 40.7128);
        assert_eq!(haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0)), 0.0);
    }
}
