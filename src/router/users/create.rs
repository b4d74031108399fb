use axum::extract::State;
use axum::response::Response;
use validator::{Validate, ValidationErrors};

use super::{check_login, created};
use crate::AppState;
use crate::error::Result;
use crate::model::user::UserCreateDto;
use crate::router::negotiate::{Format, Payload};

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    format: Format,
    payload: Payload<UserCreateDto>,
) -> Result<Response> {
    let body = payload.required()?;

    let mut errors = body.validate().err().unwrap_or_else(ValidationErrors::new);
    check_login(body.login.as_deref(), &mut errors);
    if !errors.errors().is_empty() {
        return Err(errors.into());
    }

    let user = state
        .users
        .insert(state.mapper.create_to_entity(body))
        .await?;

    tracing::info!(user_id = %user.id, login = %user.login, "user created");

    Ok(created(&state, format, user.id))
}
