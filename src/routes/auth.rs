use actix_web::{dev::Payload, http::header, web, Either, FromRequest, HttpRequest, HttpResponse};
use std::future::Future;
use std::pin::Pin;
use validator::Validate;

use crate::models::{TokenRequest, TokenResponse, User};
use crate::routes::{error::ApiError, AppState};
use crate::services::{bearer_token, AuthError};

/// The user identified by the request's bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Box::pin(async move {
            let state = state.ok_or_else(|| ApiError::internal("Application state missing"))?;
            let token = bearer_token(authorization.as_deref())?;
            let claims = state.auth.decode_token(token)?;

            let credentials = state
                .store
                .get_credentials(&claims.sub)
                .await?
                .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))?;

            Ok(CurrentUser(credentials.user))
        })
    }
}

/// Login endpoint
///
/// POST /token
///
/// Accepts `username` and `password` as a form or JSON body.
pub async fn login(
    state: web::Data<AppState>,
    form: Either<web::Form<TokenRequest>, web::Json<TokenRequest>>,
) -> Result<HttpResponse, ApiError> {
    let req = match form {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    };
    req.validate()?;

    let credentials = state.store.get_credentials(&req.username).await?;

    let verified = credentials
        .as_ref()
        .map(|c| state.auth.verify_password(&req.password, &c.hashed_password))
        .unwrap_or(false);

    if !verified {
        tracing::info!("Failed login for {}", req.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.auth.issue_token(&req.username)?;
    tracing::debug!("Issued token for {}", req.username);

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}
