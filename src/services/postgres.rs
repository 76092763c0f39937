use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{BoundingBox, Coordinate, MusicPreference, NewMusicPreference, User, UserCredentials};
use crate::services::store::{StoreError, UserStore};

const USER_COLUMNS: &str = "id, username, latitude, longitude, created_at";
const MUSIC_COLUMNS: &str = "id, user_id, track_name, artist_name, genre, spotify_id, file_path";

/// PostgreSQL-backed user store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run the schema migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Attach music preferences to each user, one query for the whole batch
    async fn with_music(&self, mut users: Vec<User>) -> Result<Vec<User>, StoreError> {
        if users.is_empty() {
            return Ok(users);
        }

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let query = format!(
            "SELECT {} FROM music_preferences WHERE user_id = ANY($1) ORDER BY id",
            MUSIC_COLUMNS
        );

        let rows = sqlx::query(&query).bind(&ids).fetch_all(&self.pool).await?;

        let mut by_user: HashMap<i64, Vec<MusicPreference>> = HashMap::new();
        for row in &rows {
            let music = music_from_row(row);
            by_user.entry(music.user_id).or_default().push(music);
        }

        for user in &mut users {
            user.music_preferences = by_user.remove(&user.id).unwrap_or_default();
        }

        Ok(users)
    }

    async fn with_music_one(&self, user: Option<User>) -> Result<Option<User>, StoreError> {
        match user {
            Some(user) => Ok(self.with_music(vec![user]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        music_preferences: Vec::new(),
        created_at: row.get("created_at"),
    }
}

fn music_from_row(row: &PgRow) -> MusicPreference {
    MusicPreference {
        id: row.get("id"),
        user_id: row.get("user_id"),
        track_name: row.get("track_name"),
        artist_name: row.get("artist_name"),
        genre: row.get("genre"),
        spotify_id: row.get("spotify_id"),
        file_path: row.get("file_path"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, username: &str, hashed_password: &str) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (username, hashed_password) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(username)
            .bind(hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!("Username {} already registered", username))
                } else {
                    e.into()
                }
            })?;

        let user = user_from_row(&row);
        tracing::info!("Created user {} ({})", user.username, user.id);

        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_music_one(row.as_ref().map(user_from_row)).await
    }

    async fn get_credentials(&self, username: &str) -> Result<Option<UserCredentials>, StoreError> {
        let query = format!(
            "SELECT {}, hashed_password FROM users WHERE username = $1",
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let hashed_password: String = row.get("hashed_password");
        let user = self.with_music_one(Some(user_from_row(&row))).await?;

        Ok(user.map(|user| UserCredentials { user, hashed_password }))
    }

    async fn list_users_with_coordinates(
        &self,
        bbox: Option<&BoundingBox>,
    ) -> Result<Vec<User>, StoreError> {
        let base = format!(
            "SELECT {} FROM users WHERE latitude IS NOT NULL AND longitude IS NOT NULL",
            USER_COLUMNS
        );

        let rows = match bbox {
            None => {
                sqlx::query(&format!("{} ORDER BY id", base))
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(b) => {
                let lon_clause = if b.wraps_antimeridian {
                    "(longitude >= $3 OR longitude <= $4)"
                } else {
                    "longitude BETWEEN $3 AND $4"
                };
                let query = format!(
                    "{} AND latitude BETWEEN $1 AND $2 AND {} ORDER BY id",
                    base, lon_clause
                );

                sqlx::query(&query)
                    .bind(b.min_lat)
                    .bind(b.max_lat)
                    .bind(b.min_lon)
                    .bind(b.max_lon)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let users: Vec<User> = rows.iter().map(user_from_row).collect();
        tracing::debug!("Loaded {} users with coordinates", users.len());

        self.with_music(users).await
    }

    async fn update_location(
        &self,
        user_id: i64,
        coordinate: Coordinate,
    ) -> Result<Option<User>, StoreError> {
        let query = format!(
            "UPDATE users SET latitude = $2, longitude = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(coordinate.latitude)
            .bind(coordinate.longitude)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!("Updated location for user {}: {:?}", user_id, coordinate);

        self.with_music_one(row.as_ref().map(user_from_row)).await
    }

    async fn create_music_preference(
        &self,
        user_id: i64,
        music: NewMusicPreference,
    ) -> Result<MusicPreference, StoreError> {
        let query = format!(
            r#"
            INSERT INTO music_preferences (user_id, track_name, artist_name, genre, spotify_id, file_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MUSIC_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(&music.track_name)
            .bind(&music.artist_name)
            .bind(&music.genre)
            .bind(&music.spotify_id)
            .bind(&music.file_path)
            .fetch_one(&self.pool)
            .await?;

        Ok(music_from_row(&row))
    }

    async fn list_music_preferences(&self, user_id: i64) -> Result<Vec<MusicPreference>, StoreError> {
        let query = format!(
            "SELECT {} FROM music_preferences WHERE user_id = $1 ORDER BY id",
            MUSIC_COLUMNS
        );

        let rows = sqlx::query(&query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(music_from_row).collect())
    }

    async fn get_music_preference(&self, music_id: i64) -> Result<Option<MusicPreference>, StoreError> {
        let query = format!("SELECT {} FROM music_preferences WHERE id = $1", MUSIC_COLUMNS);

        let row = sqlx::query(&query)
            .bind(music_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(music_from_row))
    }

    async fn delete_music_preference(
        &self,
        music_id: i64,
    ) -> Result<Option<MusicPreference>, StoreError> {
        let query = format!(
            "DELETE FROM music_preferences WHERE id = $1 RETURNING {}",
            MUSIC_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(music_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(music_from_row))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
