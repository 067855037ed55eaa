use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::Password;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let Json(body) = body?;

    state
        .user_service
        .change_password(&authenticated.user_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageData::new("Password updated successfully"),
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

impl ChangePasswordRequest {
    fn try_into_command(self) -> Result<ChangePasswordCommand, UserError> {
        Ok(ChangePasswordCommand {
            current_password: Password::new(self.current_password)?,
            new_password: Password::new(self.new_password)?,
        })
    }
}
