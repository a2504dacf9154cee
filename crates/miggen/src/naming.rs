//! Identifier conversions shared by model files, tables and indexes.

use crate::error::{MiggenError, MiggenResult};

/// `UserProfile` -> `user_profile`.
///
/// An underscore goes before every ASCII uppercase letter except the first
/// character, so acronyms split per letter (`HTTPServer` -> `h_t_t_p_server`).
/// Non-ASCII characters are only lowercased.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Table a model maps to by convention: snake case plus a trailing `s`.
pub fn table_name(model: &str) -> String {
    format!("{}s", to_snake_case(model))
}

/// Index created by `add-index` / removed by `drop-index`.
pub fn index_name(column: &str) -> String {
    format!("idx_{column}")
}

/// Go identifiers only: a letter or `_`, then letters, digits or `_`.
///
/// Anything else would be spliced verbatim into generated Go code, so it is
/// rejected before a file is touched.
pub fn validate_ident(what: &str, name: &str) -> MiggenResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(MiggenError::InvalidInput(format!("{what} must not be empty")));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(MiggenError::InvalidInput(format!(
            "{what} must start with a letter or `_`: {name}"
        )));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(MiggenError::InvalidInput(format!(
            "{what} contains invalid character {bad:?}: {name}"
        )));
    }
    Ok(())
}
