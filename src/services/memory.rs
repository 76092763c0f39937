use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::core::distance::is_within_bounding_box;
use crate::models::{BoundingBox, Coordinate, MusicPreference, NewMusicPreference, User, UserCredentials};
use crate::services::store::{StoreError, UserStore};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserCredentials>,
    music: BTreeMap<i64, MusicPreference>,
    next_user_id: i64,
    next_music_id: i64,
}

impl Tables {
    fn hydrate(&self, user: &User) -> User {
        let mut user = user.clone();
        user.music_preferences = self
            .music
            .values()
            .filter(|m| m.user_id == user.id)
            .cloned()
            .collect();
        user
    }
}

/// In-process user store for local development and tests
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, username: &str, hashed_password: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|c| c.user.username == username) {
            return Err(StoreError::Conflict(format!("Username {} already registered", username)));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            latitude: None,
            longitude: None,
            music_preferences: Vec::new(),
            created_at: Some(chrono::Utc::now()),
        };

        tables.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                hashed_password: hashed_password.to_string(),
            },
        );

        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|c| tables.hydrate(&c.user)))
    }

    async fn get_credentials(&self, username: &str) -> Result<Option<UserCredentials>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|c| c.user.username == username)
            .map(|c| UserCredentials {
                user: tables.hydrate(&c.user),
                hashed_password: c.hashed_password.clone(),
            }))
    }

    async fn list_users_with_coordinates(
        &self,
        bbox: Option<&BoundingBox>,
    ) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|c| match (c.user.coordinate(), bbox) {
                (Some(coordinate), Some(bbox)) => is_within_bounding_box(coordinate, bbox),
                (Some(_), None) => true,
                (None, _) => false,
            })
            .map(|c| tables.hydrate(&c.user))
            .collect())
    }

    async fn update_location(
        &self,
        user_id: i64,
        coordinate: Coordinate,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(credentials) = tables.users.get_mut(&user_id) else {
            return Ok(None);
        };

        credentials.user.set_coordinate(coordinate);
        let user = credentials.user.clone();

        Ok(Some(tables.hydrate(&user)))
    }

    async fn create_music_preference(
        &self,
        user_id: i64,
        music: NewMusicPreference,
    ) -> Result<MusicPreference, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound(format!("User {}", user_id)));
        }

        tables.next_music_id += 1;
        let preference = MusicPreference {
            id: tables.next_music_id,
            user_id,
            track_name: music.track_name,
            artist_name: music.artist_name,
            genre: music.genre,
            spotify_id: music.spotify_id,
            file_path: music.file_path,
        };
        tables.music.insert(preference.id, preference.clone());

        Ok(preference)
    }

    async fn list_music_preferences(&self, user_id: i64) -> Result<Vec<MusicPreference>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .music
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_music_preference(&self, music_id: i64) -> Result<Option<MusicPreference>, StoreError> {
        Ok(self.tables.read().await.music.get(&music_id).cloned())
    }

    async fn delete_music_preference(
        &self,
        music_id: i64,
    ) -> Result<Option<MusicPreference>, StoreError> {
        Ok(self.tables.write().await.music.remove(&music_id))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
