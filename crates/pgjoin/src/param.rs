//! Parameter storage for rendered statements.

use crate::value::SqlValue;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param(Arc<SqlValue>);

impl Param {
    pub fn new(value: impl Into<SqlValue>) -> Self {
        Param(Arc::new(value.into()))
    }

    pub fn value(&self) -> &SqlValue {
        &self.0
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

/// Ordered parameters; the value at index `i` binds `$i+1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push(&mut self, value: impl Into<SqlValue>) -> usize {
        self.params.push(Param::new(value));
        self.params.len()
    }

    /// Add a pre-wrapped Param and return its 1-based index.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Value bound to placeholder `$index`.
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        index
            .checked_sub(1)
            .and_then(|i| self.params.get(i))
            .map(Param::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SqlValue> {
        self.params.iter().map(Param::value)
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Replace every `$n` placeholder in `sql` with the literal of its value.
///
/// Placeholders are scanned as whole tokens, so `$1` never matches the
/// prefix of `$10`. Text inside single-quoted literals is left untouched.
pub fn inline_params(sql: &str, params: &ParamList) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut chars = sql.char_indices().peekable();
    let mut in_literal = false;

    while let Some((_, c)) = chars.next() {
        if c == '\'' {
            in_literal = !in_literal;
            out.push(c);
            continue;
        }
        if c != '$' || in_literal {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }

        match digits.parse::<usize>().ok().and_then(|n| params.get(n)) {
            Some(value) => out.push_str(&value.to_literal()),
            None => {
                out.push('$');
                out.push_str(&digits);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_params_matches_whole_placeholders() {
        let mut params = ParamList::new();
        for i in 1..=10_i64 {
            params.push(i * 100);
        }
        let sql = "a = $1 AND b = $10";
        assert_eq!(inline_params(sql, &params), "a = 100 AND b = 1000");
    }

    #[test]
    fn inline_params_skips_quoted_text_and_unknown_indexes() {
        let mut params = ParamList::new();
        params.push("x");
        let sql = "a = $1 AND b = '$1' AND c = $2";
        assert_eq!(inline_params(sql, &params), "a = 'x' AND b = '$1' AND c = $2");
    }
}
