use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BoundingBox, Coordinate, MusicPreference, NewMusicPreference, User, UserCredentials};

/// Errors that can occur when reading or writing users
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Persistence for users and their music preferences
///
/// The proximity search only needs `list_users_with_coordinates` and
/// `update_location`; the rest backs the account and music endpoints.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a user; fails with `Conflict` when the username is taken
    async fn create_user(&self, username: &str, hashed_password: &str) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    /// Look up a user together with its password hash
    async fn get_credentials(&self, username: &str) -> Result<Option<UserCredentials>, StoreError>;

    /// Users whose latitude and longitude are both set, ordered by id
    ///
    /// When `bbox` is given the store may return only users inside it.
    async fn list_users_with_coordinates(
        &self,
        bbox: Option<&BoundingBox>,
    ) -> Result<Vec<User>, StoreError>;

    /// Set a user's coordinate, returning the updated user if it exists
    async fn update_location(
        &self,
        user_id: i64,
        coordinate: Coordinate,
    ) -> Result<Option<User>, StoreError>;

    async fn create_music_preference(
        &self,
        user_id: i64,
        music: NewMusicPreference,
    ) -> Result<MusicPreference, StoreError>;

    async fn list_music_preferences(&self, user_id: i64) -> Result<Vec<MusicPreference>, StoreError>;

    async fn get_music_preference(&self, music_id: i64) -> Result<Option<MusicPreference>, StoreError>;

    /// Remove a music preference, returning the deleted row
    async fn delete_music_preference(
        &self,
        music_id: i64,
    ) -> Result<Option<MusicPreference>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
