/// CSV and PDF rendering
///
/// Both renderers produce in-memory byte buffers; the API streams them back
/// as attachments and the worker attaches invoice PDFs to emails.
///
/// - [`csv`]: header plus one record per row, RFC 4180 quoting
/// - [`pdf`]: A4 documents with headings, label/value lines and ruled tables

pub mod csv;
pub mod pdf;

/// Errors raised while rendering an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Writing to the output buffer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formats cents as dollars with two decimals (`123456` -> `"1234.56"`)
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Formats hours with up to two decimals, trimming trailing zeros
pub fn format_hours(hours: f64) -> String {
    let text = format!("{:.2}", hours);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(123456), "1234.56");
        assert_eq!(format_cents(-250), "-2.50");
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(0.0), "0");
        assert_eq!(format_hours(7.5), "7.5");
        assert_eq!(format_hours(8.0), "8");
        assert_eq!(format_hours(2.25), "2.25");
        assert_eq!(format_hours(1.0 / 3.0), "0.33");
    }
}
