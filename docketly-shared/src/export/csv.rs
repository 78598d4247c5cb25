/// In-memory CSV rendering
///
/// Exports implement [`CsvRow`] and are rendered with [`to_csv`]; ad hoc
/// tables go through [`write_csv`].
///
/// # Example
///
/// ```
/// use docketly_shared::export::csv::write_csv;
///
/// let bytes = write_csv(&["nickname", "hours"], vec![vec!["BAZ".to_string(), "7.5".to_string()]]).unwrap();
/// assert_eq!(String::from_utf8(bytes).unwrap(), "nickname,hours\nBAZ,7.5\n");
/// ```

use csv::Writer;

use super::ExportError;

/// A type that can be written as one CSV record
pub trait CsvRow {
    /// Column headers, in record order
    fn headers() -> &'static [&'static str];

    /// Field values, in header order
    fn record(&self) -> Vec<String>;
}

/// Writes a header and rows into a byte buffer
pub fn write_csv<I>(headers: &[&str], rows: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = Writer::from_writer(Vec::new());

    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Renders every item as a CSV record under `T::headers()`
pub fn to_csv<T: CsvRow>(items: &[T]) -> Result<Vec<u8>, ExportError> {
    write_csv(T::headers(), items.iter().map(CsvRow::record))
}
