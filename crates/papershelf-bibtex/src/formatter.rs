//! BibTeX formatting module
//!
//! Converts [`Entry`] structures back to BibTeX text.

use crate::entry::Entry;

/// Format a single entry
pub fn format_entry(entry: &Entry) -> String {
    let mut result = format!("@{}{{{},\n", entry.entry_type.as_str(), entry.cite_key);

    for field in &entry.fields {
        result.push_str("    ");
        result.push_str(&field.name);
        result.push_str(" = ");
        result.push_str(&format_value(&field.value));
        result.push_str(",\n");
    }

    result.push('}');
    result
}

/// Numbers stay bare, everything else is braced so LaTeX markup survives.
fn format_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value.to_string();
    }
    format!("{{{}}}", value)
}
