use axum::http::StatusCode;

use super::ApiSuccess;
use super::MessageData;

pub async fn index() -> ApiSuccess<MessageData> {
    ApiSuccess::new(StatusCode::OK, MessageData::new("Hello World!"))
}
