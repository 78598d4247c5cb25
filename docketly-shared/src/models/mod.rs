/// Database models
///
/// Each model owns its SQL. Reads scoped to a tenant take the tenant ID
/// explicitly; writes that must share a transaction accept any
/// [`sqlx::PgExecutor`] so callers can pass `&mut *tx`.
///
/// # Models
///
/// - `tenant`: The labour-hire company operating the system
/// - `user`: Login identities and their [`user::Role`]
/// - `builder`, `builder_location`: Client companies and their sites
/// - `contractor`: Paid workers with encrypted bank details
/// - `docket`, `docket_entry`: Daily work reports and per-contractor hours
/// - `worker_invoice`: Weekly invoices and their status workflow
/// - `notification`: Email outbox drained by the worker

pub mod builder;
pub mod builder_location;
pub mod contractor;
pub mod docket;
pub mod docket_entry;
pub mod notification;
pub mod tenant;
pub mod user;
pub mod worker_invoice;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent JSON field from an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`: a missing
/// field stays `None`, `null` becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Wraps a free-text search term for `ILIKE`
pub(crate) fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let escaped = s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{}%", escaped)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        phone: Option<Option<String>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.phone, None);

        let cleared: Patch = serde_json::from_str(r#"{"phone": null}"#).unwrap();
        assert_eq!(cleared.phone, Some(None));

        let set: Patch = serde_json::from_str(r#"{"phone": "0400 000 000"}"#).unwrap();
        assert_eq!(set.phone, Some(Some("0400 000 000".to_string())));
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("  ")), None);
        assert_eq!(like_pattern(Some("baz")), Some("%baz%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    }
}
