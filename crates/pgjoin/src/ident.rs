//! Validation of aliases spliced into generated SQL.

use crate::error::{BuildError, BuildResult};

/// Check that `s` is a plain unquoted SQL identifier.
///
/// Table aliases and output aliases are written into SQL verbatim, so they
/// must start with a letter or `_` and contain only ASCII alphanumerics,
/// `_` or `$`.
pub fn validate_alias(s: &str) -> BuildResult<()> {
    let invalid = |reason| {
        Err(BuildError::InvalidIdent {
            ident: s.to_string(),
            reason,
        })
    };

    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return invalid("identifier cannot be empty");
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return invalid("must start with a letter or '_'");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return invalid("only letters, digits, '_' and '$' are allowed");
    }
    Ok(())
}
