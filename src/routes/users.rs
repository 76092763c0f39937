use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{CreateUserRequest, HealthResponse, LocationParams, NearbyParams, NearbyQuery};
use crate::routes::{auth::CurrentUser, error::ApiError, AppState};

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.store.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Register a user
///
/// POST /users/
///
/// ```json
/// { "username": "string", "password": "string" }
/// ```
pub async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let hashed_password = state.auth.hash_password(&req.password)?;
    let user = state.store.create_user(&req.username, &hashed_password).await?;

    Ok(HttpResponse::Ok().json(user))
}

/// The authenticated user
///
/// GET /users/me/
pub async fn read_me(current: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(current.0)
}

/// Users near a coordinate
///
/// GET /users/nearby/?latitude={lat}&longitude={lon}&radius_km={km}
///
/// `radius_km` falls back to the configured default.
pub async fn nearby_users(
    state: web::Data<AppState>,
    current: CurrentUser,
    params: web::Query<NearbyParams>,
) -> Result<HttpResponse, ApiError> {
    params.validate()?;

    let center = params.coordinate();
    let radius_km = params.radius_km.unwrap_or(state.default_radius_km);

    if !center.is_valid() || !radius_km.is_finite() {
        return Err(ApiError::bad_request(
            "Validation failed",
            "latitude, longitude and radius_km must be finite numbers",
        ));
    }

    tracing::info!(
        "User {} searching within {}km of ({}, {})",
        current.0.id,
        radius_km,
        center.latitude,
        center.longitude
    );

    let users = state
        .nearby
        .find_nearby(&NearbyQuery { center, radius_km })
        .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Update the authenticated user's location
///
/// PUT /users/location/?latitude={lat}&longitude={lon}
pub async fn update_location(
    state: web::Data<AppState>,
    current: CurrentUser,
    params: web::Query<LocationParams>,
) -> Result<HttpResponse, ApiError> {
    params.validate()?;

    let coordinate = params.coordinate();
    if !coordinate.is_valid() {
        return Err(ApiError::bad_request(
            "Validation failed",
            "latitude and longitude must be finite numbers",
        ));
    }

    let user = state
        .nearby
        .update_location(current.0.id, coordinate)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", current.0.id)))?;

    Ok(HttpResponse::Ok().json(user))
}
