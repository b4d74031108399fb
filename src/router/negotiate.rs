//! JSON/XML content negotiation for requests and responses.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ServerError;

const JSON: &str = "application/json";
const XML: &str = "application/xml";

/// Response serialization picked from the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// Choose a format from an `Accept` header value, honouring quality
    /// values. `None` means nothing acceptable can be produced.
    pub fn from_accept(accept: &str) -> Option<Self> {
        if accept.trim().is_empty() {
            return Some(Format::Json);
        }

        let mut ranges: Vec<(f32, &str)> = accept
            .split(',')
            .filter_map(|range| {
                let mut params = range.split(';');
                let media = params.next()?.trim();
                let quality = params
                    .filter_map(|param| param.trim().strip_prefix("q="))
                    .find_map(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (!media.is_empty()).then_some((quality, media))
            })
            .collect();

        // Stable sort keeps header order between equal qualities.
        ranges.sort_by(|a, b| b.0.total_cmp(&a.0));

        ranges
            .into_iter()
            .filter(|(quality, _)| *quality > 0.0)
            .find_map(|(_, media)| match media.to_ascii_lowercase().as_str() {
                "application/json" | "text/json" | "application/*" | "*/*" => {
                    Some(Format::Json)
                },
                "application/xml" | "text/xml" | "text/*" => Some(Format::Xml),
                _ => None,
            })
    }

    /// Serialize `value` into a response body. `root` names the XML
    /// document element.
    pub fn render<T: Serialize>(self, root: &str, value: &T) -> Response {
        let body = match self {
            Format::Json => serde_json::to_string(value).map_err(|err| err.to_string()),
            Format::Xml => {
                quick_xml::se::to_string_with_root(root, value).map_err(|err| err.to_string())
            },
        };

        match body {
            Ok(body) => {
                let mime = match self {
                    Format::Json => JSON,
                    Format::Xml => XML,
                };
                ([(header::CONTENT_TYPE, HeaderValue::from_static(mime))], body).into_response()
            },
            Err(details) => ServerError::Internal { details }.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for Format
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(header::ACCEPT) {
            None => Ok(Format::Json),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(Format::from_accept)
                .ok_or(ServerError::NotAcceptable),
        }
    }
}

fn is_xml(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == XML || mime == "text/xml"
        })
        .unwrap_or(false)
}

/// Request body decoded from JSON or XML according to `Content-Type`.
///
/// An empty body and a JSON `null` both yield `None`.
#[derive(Debug)]
pub struct Payload<T>(pub Option<T>);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let xml = is_xml(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| match err.status() {
                StatusCode::BAD_REQUEST => ServerError::MalformedRequest(err.body_text()),
                status => ServerError::BodyRejected {
                    status,
                    details: err.body_text(),
                },
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(None));
        }

        if xml {
            let text = std::str::from_utf8(&bytes)
                .map_err(|err| ServerError::MalformedRequest(err.to_string()))?;
            quick_xml::de::from_str::<T>(text)
                .map(|value| Payload(Some(value)))
                .map_err(|err| ServerError::MalformedRequest(err.to_string()))
        } else {
            serde_json::from_slice::<Option<T>>(&bytes)
                .map(Payload)
                .map_err(|err| ServerError::MalformedRequest(err.to_string()))
        }
    }
}

impl<T> Payload<T> {
    /// Body content, or [`ServerError::MissingBody`] when absent.
    pub fn required(self) -> Result<T, ServerError> {
        self.0.ok_or(ServerError::MissingBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_accept() {
        assert_eq!(Format::from_accept(""), Some(Format::Json));
        assert_eq!(Format::from_accept("application/json"), Some(Format::Json));
        assert_eq!(Format::from_accept("*/*"), Some(Format::Json));
        assert_eq!(Format::from_accept("application/xml"), Some(Format::Xml));
        assert_eq!(Format::from_accept("text/xml; charset=utf-8"), Some(Format::Xml));
        assert_eq!(
            Format::from_accept("text/html, application/xml;q=0.9, */*;q=0.8"),
            Some(Format::Xml)
        );
        assert_eq!(
            Format::from_accept("application/xml;q=0.5, application/json"),
            Some(Format::Json)
        );
        assert_eq!(Format::from_accept("application/json;q=0, text/xml"), Some(Format::Xml));
        assert_eq!(Format::from_accept("text/html"), None);
        assert_eq!(Format::from_accept("image/png, text/plain"), None);
    }

    #[test]
    fn test_is_xml() {
        let mut headers = HeaderMap::new();
        assert!(!is_xml(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_xml(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml; charset=utf-8"),
        );
        assert!(is_xml(&headers));
    }

    #[tokio::test]
    async fn test_payload_json_null_is_absent() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, JSON)
            .body(axum::body::Body::from("null"))
            .unwrap();

        let Payload(body) = Payload::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_payload_malformed() {
        let req = Request::builder()
            .header(header::CONTENT_TYPE, JSON)
            .body(axum::body::Body::from("{\"login\":"))
            .unwrap();

        let err = Payload::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::MalformedRequest(_)));
    }

    #[tokio::test]
    async fn test_payload_over_body_limit() {
        use axum::Router;
        use axum::extract::DefaultBodyLimit;
        use axum::routing::post;
        use tower::util::ServiceExt;

        let app = Router::new()
            .route(
                "/",
                post(|Payload(body): Payload<serde_json::Value>| async move {
                    body.map(|_| StatusCode::OK).unwrap_or(StatusCode::NO_CONTENT)
                }),
            )
            .layer(DefaultBodyLimit::max(8));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, JSON)
                    .body(axum::body::Body::from("{\"login\":\"abcdefghijklmnop\"}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
