// Route exports
pub mod auth;
pub mod error;
pub mod music;
pub mod users;

use actix_web::web;
use std::sync::Arc;

use crate::services::{Authenticator, NearbyService, UploadStorage, UserStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub nearby: NearbyService,
    pub auth: Arc<Authenticator>,
    pub storage: UploadStorage,
    pub default_radius_km: f64,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(users::health_check))
        .route("/token", web::post().to(auth::login))
        .route("/users/", web::post().to(users::create_user))
        .route("/users/me/", web::get().to(users::read_me))
        .route("/users/nearby/", web::get().to(users::nearby_users))
        .route("/users/location/", web::put().to(users::update_location))
        .route("/users/music/", web::post().to(music::add_music))
        .route("/users/music/", web::get().to(music::list_music))
        .route("/users/music/upload/", web::post().to(music::upload_music))
        .route("/users/music/{music_id}", web::delete().to(music::delete_music));
}
