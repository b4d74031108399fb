//! Error handler for the users API.

use std::collections::BTreeMap;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::user::RepositoryError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("request body is missing")]
    MissingBody,

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("request body rejected: {details}")]
    BodyRejected { status: StatusCode, details: String },

    #[error("user not found")]
    NotFound,

    #[error("none of the accepted media types can be produced")]
    NotAcceptable,

    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("required fields are missing")]
    Unprocessable,

    #[error("repository refused the upsert")]
    UpsertRejected,

    #[error("repository failure: {0}")]
    Repository(#[from] RepositoryError),

    #[error("internal server error, {details}")]
    Internal { details: String },
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field, keyed by PascalCase field name.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(field_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/problem+json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

/// `first_name` becomes `FirstName`.
fn pascal_case(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, issues)| {
            let messages = issues
                .iter()
                .map(|issue| match &issue.message {
                    Some(message) => message.to_string(),
                    None => issue.code.to_string(),
                })
                .collect();
            (pascal_case(field), messages)
        })
        .collect()
}

fn empty(status: StatusCode) -> Response {
    status.into_response()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = match &self {
            ServerError::MissingBody | ServerError::MalformedRequest(_) => ResponseError::default()
                .title("Request is missing a body or is malformed.")
                .details(&self.to_string())
                .status(StatusCode::BAD_REQUEST),

            ServerError::BodyRejected { status, .. } => ResponseError::default()
                .title("Request body could not be read.")
                .details(&self.to_string())
                .status(*status),

            ServerError::Validation(validation_errors) => ResponseError::default()
                .title("There were validation errors with your request.")
                .details(&self.to_string())
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .errors(validation_errors),

            ServerError::NotFound => return empty(StatusCode::NOT_FOUND),
            ServerError::NotAcceptable => return empty(StatusCode::NOT_ACCEPTABLE),
            ServerError::Unprocessable => return empty(StatusCode::UNPROCESSABLE_ENTITY),
            ServerError::UpsertRejected => return empty(StatusCode::BAD_REQUEST),

            ServerError::Repository(err) => {
                tracing::error!(error = %err, "repository call failed");
                ResponseError::default()
            },

            ServerError::Internal { details } => {
                tracing::error!(%details, "server returned 500 status");
                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/problem+json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
