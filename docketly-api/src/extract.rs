/// Request extractors with JSON rejections
///
/// Drop-in replacements for axum's `Json`, `Query` and `Path` extractors.
/// A body, query string or path segment that fails to parse is answered
/// with the usual [`ApiError`] JSON body instead of axum's plain-text
/// rejection.
///
/// # Example
///
/// ```no_run
/// use docketly_api::error::ApiResult;
/// use docketly_api::extract::{ApiJson, ApiPath};
/// use axum::Json;
/// use uuid::Uuid;
///
/// async fn rename(ApiPath(id): ApiPath<Uuid>, ApiJson(name): ApiJson<String>) -> ApiResult<Json<String>> {
///     Ok(Json(format!("{} is now {}", id, name)))
/// }
/// ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON that does not fit the expected shape
            JsonRejection::JsonDataError(err) => ApiError::invalid("body", err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => ApiError::BadRequest(err.body_text()),
            other => ApiError::InternalError(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::Service as _;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Paging {
        #[allow(dead_code)]
        page: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Rename {
        #[allow(dead_code)]
        name: String,
    }

    fn router() -> Router {
        Router::new()
            .route("/items", get(|ApiQuery(_): ApiQuery<Paging>| async { "ok" }))
            .route("/items/:id", post(|ApiPath(_): ApiPath<Uuid>, ApiJson(_): ApiJson<Rename>| async { "ok" }))
    }

    async fn error_code(request: Request<Body>) -> (StatusCode, String) {
        let response = router().call(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).expect("Body should be JSON");
        assert!(json["message"].is_string());
        (status, json["error"].as_str().unwrap_or_default().to_string())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_bad_query_is_json_error() {
        let request = Request::builder().uri("/items?page=abc").body(Body::empty()).unwrap();
        assert_eq!(error_code(request).await, (StatusCode::BAD_REQUEST, "bad_request".to_string()));
    }

    #[tokio::test]
    async fn test_bad_path_is_json_error() {
        let request = post_json("/items/not-a-uuid", r#"{"name":"Lot 12"}"#);
        assert_eq!(error_code(request).await, (StatusCode::BAD_REQUEST, "bad_request".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let uri = format!("/items/{}", Uuid::new_v4());
        assert_eq!(
            error_code(post_json(&uri, "{not json")).await,
            (StatusCode::BAD_REQUEST, "bad_request".to_string())
        );
        assert_eq!(
            error_code(post_json(&uri, r#"{"title":"Lot 12"}"#)).await,
            (StatusCode::UNPROCESSABLE_ENTITY, "validation_error".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/items/{}", Uuid::new_v4()))
            .body(Body::from(r#"{"name":"Lot 12"}"#))
            .unwrap();
        assert_eq!(error_code(request).await, (StatusCode::BAD_REQUEST, "bad_request".to_string()));
    }
}
