use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and within [-90, 90] / [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(value: Coordinate) -> Self {
        geo::Point::new(value.longitude, value.latitude)
    }
}

impl From<geo::Point<f64>> for Coordinate {
    fn from(value: geo::Point<f64>) -> Self {
        Coordinate::new(value.y(), value.x())
    }
}

/// A registered user as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub music_preferences: Vec<MusicPreference>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    /// The user's location, present only when both components are set
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        }
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.latitude = Some(coordinate.latitude);
        self.longitude = Some(coordinate.longitude);
    }
}

/// A user row together with its stored password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// A music track shared by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicPreference {
    pub id: i64,
    pub user_id: i64,
    pub track_name: String,
    pub artist_name: String,
    pub genre: String,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Fields needed to create a music preference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMusicPreference {
    pub track_name: String,
    pub artist_name: String,
    pub genre: String,
    #[serde(default)]
    pub spotify_id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Geospatial bounding box
///
/// When `wraps_antimeridian` is set the longitude range is
/// `lon >= min_lon OR lon <= max_lon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub wraps_antimeridian: bool,
}

impl BoundingBox {
    /// Box covering the whole globe
    pub const WORLD: BoundingBox = BoundingBox {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lon: -180.0,
        max_lon: 180.0,
        wraps_antimeridian: false,
    };
}

/// Nearby-users query parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub center: Coordinate,
    pub radius_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(latitude: Option<f64>, longitude: Option<f64>) -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            latitude,
            longitude,
            music_preferences: vec![],
            created_at: None,
        }
    }

    #[test]
    fn test_coordinate_requires_both_components() {
        assert_eq!(user(Some(1.0), Some(2.0)).coordinate(), Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(user(Some(1.0), None).coordinate(), None);
        assert_eq!(user(None, Some(2.0)).coordinate(), None);
        assert_eq!(user(None, None).coordinate(), None);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_geo_point_conversion() {
        let point: geo::Point<f64> = Coordinate::new(51.5, -0.12).into();
        assert_eq!(point.x(), -0.12);
        assert_eq!(point.y(), 51.5);
        assert_eq!(Coordinate::from(point), Coordinate::new(51.5, -0.12));
    }

    #[test]
    fn test_user_serializes_absent_location_as_null() {
        let json = serde_json::to_value(user(None, None)).unwrap();
        assert!(json["latitude"].is_null());
        assert!(json["longitude"].is_null());
    }
}
