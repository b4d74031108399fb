//! Users-related HTTP API.
mod create;
mod get;
mod update;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use url::Url;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::AppState;
use crate::router::negotiate::Format;
use crate::user::UserEntity;

/// Prefix every users route is nested under.
pub const USERS_PATH: &str = "/api/users";
/// XML document element of a [`crate::model::user::UserDto`].
const USER_ROOT: &str = "user";
/// XML document element of a bare identifier.
const ID_ROOT: &str = "guid";
const LOGIN_MESSAGE: &str = "Should contain only letters or digits";

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /api/users` goes to `create`.
        .route("/", post(create::handler))
        // `GET /api/users/{user_id}` goes to `get`, `PUT` to `update`.
        .route("/{user_id}", get(get::handler).put(update::handler))
}

/// Location of `GET /api/users/{id}`, absolute when a public URL is
/// configured.
pub(crate) fn location(base_url: &str, id: Uuid) -> String {
    let path = format!("{USERS_PATH}/{id}");
    if base_url.is_empty() {
        return path;
    }

    Url::parse(base_url)
        .and_then(|base| base.join(&path))
        .map(|url| url.to_string())
        .unwrap_or(path)
}

/// `201 Created` carrying the new identifier and its location.
fn created(state: &AppState, format: Format, id: Uuid) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location(&state.config.url, id))],
        format.render(ID_ROOT, &id),
    )
        .into_response()
}

/// Record a `login` error when it holds anything but letters or digits.
fn check_login(login: Option<&str>, errors: &mut ValidationErrors) {
    if login.is_some_and(|login| !UserEntity::is_valid_login(login)) {
        errors.add(
            "login",
            ValidationError::new("alphanumeric").with_message(LOGIN_MESSAGE.into()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location() {
        let id = Uuid::new_v4();
        assert_eq!(location("", id), format!("/api/users/{id}"));
        assert_eq!(
            location("https://example.com/", id),
            format!("https://example.com/api/users/{id}")
        );
        assert_eq!(location("not a url", id), format!("/api/users/{id}"));
    }

    #[test]
    fn test_check_login() {
        let mut errors = ValidationErrors::new();
        check_login(Some("abc123"), &mut errors);
        check_login(None, &mut errors);
        assert!(errors.errors().is_empty());

        check_login(Some("abc-123"), &mut errors);
        assert!(errors.field_errors().contains_key("login"));
    }
}
