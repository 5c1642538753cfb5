//! Default index and constraint names.

/// Builds the default name of an index or constraint:
/// `<table>_<col1>_<col2>_<suffix>`, lowercased, with `-` and `.` replaced
/// by `_`.
#[must_use]
pub fn index_name(table: &str, columns: &[String], suffix: &str) -> String {
    let mut parts = Vec::with_capacity(columns.len() + 2);
    parts.push(table);
    parts.extend(columns.iter().map(String::as_str));
    parts.push(suffix);

    parts.join("_").to_lowercase().replace(['-', '.'], "_")
}
