// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{BoundingBox, Coordinate, MusicPreference, NearbyQuery, NewMusicPreference, User, UserCredentials};
pub use requests::{CreateUserRequest, LocationParams, MusicPreferenceRequest, NearbyParams, TokenRequest, UploadParams};
pub use responses::{ErrorResponse, HealthResponse, TokenResponse};
