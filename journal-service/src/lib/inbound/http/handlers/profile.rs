use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use super::UserData;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::UpdateProfileCommand;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

/// Return the stored record of the token's subject.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<ProfileResponseData>, ApiError> {
    state
        .user_service
        .get_profile(&authenticated.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::OK,
                ProfileResponseData { user: user.into() },
            )
        })
}

/// Apply a partial update and hand back a token carrying the new claims.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .user_service
        .update_profile(&authenticated.user_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileResponseData {
    pub user: UserData,
}

/// HTTP request body for updating a profile (raw JSON)
///
/// Partial update: an absent field and an explicit `null` both mean
/// "unchanged", so a stored phone number cannot be cleared through this
/// request. A blank `image` is also treated as unchanged. Present fields are
/// validated like registration input.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, UserError> {
        // Validation happens here - errors are automatically converted via #[from]
        Ok(UpdateProfileCommand {
            name: self.name.map(DisplayName::new).transpose()?,
            email: self.email.map(EmailAddress::new).transpose()?,
            phone: self.phone.map(PhoneNumber::new).transpose()?,
            image: self.image.filter(|image| !image.trim().is_empty()),
        })
    }
}
