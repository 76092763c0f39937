use actix_web::{http::header, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::models::{MusicPreferenceRequest, NewMusicPreference, UploadParams};
use crate::routes::{auth::CurrentUser, error::ApiError, AppState};
use crate::services::storage::track_name_from_filename;

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_GENRE: &str = "Unknown Genre";

/// Add a music preference
///
/// POST /users/music/
pub async fn add_music(
    state: web::Data<AppState>,
    current: CurrentUser,
    req: web::Json<MusicPreferenceRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let music = state
        .store
        .create_music_preference(current.0.id, req.into_inner().into())
        .await?;
    state.nearby.invalidate().await;

    Ok(HttpResponse::Ok().json(music))
}

/// List the authenticated user's music preferences
///
/// GET /users/music/
pub async fn list_music(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let music = state.store.list_music_preferences(current.0.id).await?;
    Ok(HttpResponse::Ok().json(music))
}

/// Upload an audio file as a music preference
///
/// POST /users/music/upload/?filename=&track_name=&artist_name=&genre=
///
/// The request body is the raw audio and `Content-Type` must be `audio/*`.
/// The track name falls back to the file name stem, and one of the two must
/// be present. Missing artist and genre become "Unknown" placeholders.
pub async fn upload_music(
    state: web::Data<AppState>,
    current: CurrentUser,
    params: web::Query<UploadParams>,
    body: web::Bytes,
    http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    params.validate()?;

    let content_type = http_req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let params = params.into_inner();
    let track_name = non_empty(params.track_name)
        .or_else(|| track_name_from_filename(params.filename.as_deref()))
        .ok_or_else(|| {
            ApiError::bad_request("Validation failed", "track_name or filename is required")
        })?;

    let file_path = state
        .storage
        .save_audio(content_type, params.filename.as_deref(), &body)
        .await?;

    let music = NewMusicPreference {
        track_name,
        artist_name: non_empty(params.artist_name).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        genre: non_empty(params.genre).unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
        spotify_id: None,
        file_path: Some(file_path.clone()),
    };

    match state.store.create_music_preference(current.0.id, music).await {
        Ok(music) => {
            state.nearby.invalidate().await;
            Ok(HttpResponse::Ok().json(music))
        }
        Err(e) => {
            if let Err(cleanup) = state.storage.remove(&file_path).await {
                tracing::warn!("Failed to clean up {} after store error: {}", file_path, cleanup);
            }
            Err(e.into())
        }
    }
}

/// Delete one of the authenticated user's music preferences
///
/// DELETE /users/music/{music_id}
pub async fn delete_music(
    state: web::Data<AppState>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let music_id = path.into_inner();

    let music = state
        .store
        .get_music_preference(music_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Music not found"))?;

    if music.user_id != current.0.id {
        return Err(ApiError::forbidden("Not authorized to delete this music"));
    }

    if let Some(file_path) = &music.file_path {
        // The row is removed even when the file is already gone
        if let Err(e) = state.storage.remove(file_path).await {
            tracing::warn!("Error deleting file {}: {}", file_path, e);
        }
    }

    let deleted = state
        .store
        .delete_music_preference(music_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Music not found"))?;
    state.nearby.invalidate().await;

    Ok(HttpResponse::Ok().json(deleted))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
