use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Coordinate, NewMusicPreference};

/// Request to register a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Credentials exchanged for an access token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Query string of the nearby users endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NearbyParams {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 0.0))]
    pub radius_km: Option<f64>,
}

impl NearbyParams {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Query string of the location update endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationParams {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl LocationParams {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Request to add a music preference
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MusicPreferenceRequest {
    #[validate(length(min = 1, max = 100))]
    pub track_name: String,
    #[validate(length(min = 1, max = 100))]
    pub artist_name: String,
    #[validate(length(min = 1, max = 100))]
    pub genre: String,
    #[validate(length(max = 255))]
    pub spotify_id: Option<String>,
}

impl From<MusicPreferenceRequest> for NewMusicPreference {
    fn from(value: MusicPreferenceRequest) -> Self {
        NewMusicPreference {
            track_name: value.track_name,
            artist_name: value.artist_name,
            genre: value.genre,
            spotify_id: value.spotify_id,
            file_path: None,
        }
    }
}

/// Metadata sent alongside an uploaded audio body
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UploadParams {
    #[validate(length(max = 255))]
    pub filename: Option<String>,
    #[validate(length(max = 100))]
    pub track_name: Option<String>,
    #[validate(length(max = 100))]
    pub artist_name: Option<String>,
    #[validate(length(max = 100))]
    pub genre: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_params_range_validation() {
        let ok = NearbyParams { latitude: 45.0, longitude: 10.0, radius_km: Some(5.0) };
        assert!(ok.validate().is_ok());

        let bad_lat = NearbyParams { latitude: 91.0, longitude: 10.0, radius_km: None };
        assert!(bad_lat.validate().is_err());

        let negative_radius = NearbyParams { latitude: 0.0, longitude: 0.0, radius_km: Some(-1.0) };
        assert!(negative_radius.validate().is_err());
    }

    #[test]
    fn test_create_user_rejects_empty_username() {
        let req = CreateUserRequest { username: String::new(), password: "secret".to_string() };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_music_request_into_new_preference() {
        let req = MusicPreferenceRequest {
            track_name: "Teardrop".to_string(),
            artist_name: "Massive Attack".to_string(),
            genre: "Trip hop".to_string(),
            spotify_id: None,
        };
        let new: NewMusicPreference = req.into();
        assert_eq!(new.track_name, "Teardrop");
        assert!(new.file_path.is_none());
    }
}
