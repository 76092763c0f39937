// Core algorithm exports
pub mod distance;
pub mod proximity;

pub use distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box, EARTH_RADIUS_KM};
pub use proximity::{find_nearby, NearbyResult, ProximityEngine};
