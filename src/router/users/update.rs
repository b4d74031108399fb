use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{check_login, created};
use crate::error::Result;
use crate::model::user::UserUpdateDto;
use crate::router::negotiate::{Format, Payload};
use crate::user::Upsert;
use crate::{AppState, ServerError};

/// Handler to replace a user, creating it when unknown.
pub async fn handler(
    State(state): State<AppState>,
    format: Format,
    Path(user_id): Path<String>,
    payload: Payload<UserUpdateDto>,
) -> Result<Response> {
    let mut body = payload.required()?;
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|err| ServerError::MalformedRequest(format!("user identifier: {err}")))?;

    // Incomplete bodies are rejected without details.
    if body.validate().is_err() {
        return Err(ServerError::Unprocessable);
    }

    let mut errors = ValidationErrors::new();
    check_login(body.login.as_deref(), &mut errors);
    if !errors.errors().is_empty() {
        return Err(errors.into());
    }

    body.id = user_id;
    match state
        .users
        .update_or_insert(state.mapper.update_to_entity(body))
        .await
    {
        Ok(Upsert::Inserted(user)) => {
            tracing::info!(user_id = %user.id, login = %user.login, "user created");
            Ok(created(&state, format, user.id))
        },
        Ok(Upsert::Updated(user)) => {
            tracing::info!(user_id = %user.id, login = %user.login, "user updated");
            Ok(StatusCode::NO_CONTENT.into_response())
        },
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "user upsert rejected");
            Err(ServerError::UpsertRejected)
        },
    }
}
