use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::RegisterCommand;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .user_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|session| ApiSuccess::new(StatusCode::CREATED, session.into()))
}

/// HTTP request body for registration (raw JSON)
///
/// A missing or blank `image` falls back to the default avatar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    image: Option<String>,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, UserError> {
        Ok(RegisterCommand {
            name: DisplayName::new(self.name)?,
            email: EmailAddress::new(self.email)?,
            password: Password::new(self.password)?,
            phone: self.phone.map(PhoneNumber::new).transpose()?,
            image: self.image.filter(|image| !image.trim().is_empty()),
        })
    }
}
