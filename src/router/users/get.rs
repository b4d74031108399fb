//! Get a user by its identifier.

use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use super::USER_ROOT;
use crate::error::Result;
use crate::router::negotiate::Format;
use crate::{AppState, ServerError};

pub async fn handler(
    State(state): State<AppState>,
    format: Format,
    Path(user_id): Path<String>,
) -> Result<Response> {
    // A segment that is not a UUID cannot name any user.
    let user_id = Uuid::parse_str(&user_id).map_err(|_| ServerError::NotFound)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ServerError::NotFound)?;

    Ok(format.render(USER_ROOT, &state.mapper.entity_to_dto(&user)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use crate::model::user::UserDto;
    use crate::user::UserEntity;
    use crate::*;

    async fn seed(state: &AppState) -> UserEntity {
        state
            .users
            .insert(UserEntity {
                id: uuid::Uuid::nil(),
                login: "admin".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_user_handler() {
        let state = test_state();
        let user = seed(&state).await;
        let app = app(state);

        let path = format!("/api/users/{}", user.id);
        let response = make_request(app, Method::GET, &path, String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: UserDto = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            UserDto {
                id: user.id,
                login: "admin".into(),
                full_name: "Lovelace Ada".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let app = app(test_state());

        let path = format!("/api/users/{}", uuid::Uuid::new_v4());
        let response = make_request(app.clone(), Method::GET, &path, String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());

        let response =
            make_request(app, Method::GET, "/api/users/not-a-uuid", String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_user_as_xml() {
        let state = test_state();
        let user = seed(&state).await;
        let app = app(state);

        let response = app
            .oneshot(
                axum::extract::Request::builder()
                    .method(Method::GET)
                    .uri(format!("/api/users/{}", user.id))
                    .header(header::ACCEPT, "application/xml")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.starts_with("<user>"));
        assert!(body.contains(&format!("<id>{}</id>", user.id)));
        assert!(body.contains("<login>admin</login>"));
        assert!(body.contains("<fullName>Lovelace Ada</fullName>"));
    }

    #[tokio::test]
    async fn test_get_user_not_acceptable() {
        let state = test_state();
        let user = seed(&state).await;
        let app = app(state);

        let response = app
            .oneshot(
                axum::extract::Request::builder()
                    .method(Method::GET)
                    .uri(format!("/api/users/{}", user.id))
                    .header(header::ACCEPT, "text/html")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }
}
