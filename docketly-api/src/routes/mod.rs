/// API route handlers, one module per resource
///
/// Handlers check the caller's role, validate the body, then delegate to the
/// matching service in `docketly_shared::services`.

pub mod auth;
pub mod builders;
pub mod contractors;
pub mod dashboard;
pub mod dockets;
pub mod health;
pub mod history;
pub mod invoices;
pub mod users;
pub mod weekly;
pub mod worker;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use docketly_shared::{error::ServiceError, weekly::WeekRange};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// `?week=` query; `YYYY-Www` or any date in the week, default current
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekQuery {
    pub week: Option<String>,
}

impl WeekQuery {
    pub fn resolve(&self) -> ApiResult<WeekRange> {
        WeekRange::parse_or_current(self.week.as_deref())
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// Query-string errors are the client's fault, so 400 rather than 422
pub(crate) fn bad_query(err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation { .. } => ApiError::BadRequest(err.to_string()),
        other => other.into(),
    }
}

/// `text/csv` attachment
pub(crate) fn csv_download(filename: &str, body: Vec<u8>) -> ApiResult<Response> {
    download("text/csv; charset=utf-8", filename, body)
}

/// `application/pdf` attachment
pub(crate) fn pdf_download(filename: &str, body: Vec<u8>) -> ApiResult<Response> {
    download("application/pdf", filename, body)
}

fn download(content_type: &'static str, filename: &str, body: Vec<u8>) -> ApiResult<Response> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| ApiError::InternalError(format!("Bad download filename: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_query() {
        let week = WeekQuery {
            week: Some("2026-W01".to_string()),
        }
        .resolve()
        .unwrap();
        assert_eq!(week.start.to_string(), "2025-12-29");

        let err = WeekQuery {
            week: Some("next week".to_string()),
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_bad_query_keeps_other_errors() {
        assert!(matches!(
            bad_query(ServiceError::validation("from", "must not be after to")),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            bad_query(ServiceError::not_found("Contractor")),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_csv_download_headers() {
        let response = csv_download("contractors.csv", b"a,b\n".to_vec()).unwrap();
        let headers = response.headers();

        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/csv; charset=utf-8");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"contractors.csv\""
        );
    }
}
