//! Bound values.
//!
//! [`SqlValue`] is the single value type carried by conditions. It binds as a
//! `tokio-postgres` parameter, renders as an escaped literal for logging, and
//! is what rows decode into (see [`RowMap`](crate::RowMap)).

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, Utc};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// A dynamically typed SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl SqlValue {
    /// Best-effort conversion of a marker string into a number.
    ///
    /// Blank or non-numeric input is kept as text, unmodified.
    pub fn coerce_number(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return SqlValue::Text(s.to_string());
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return SqlValue::Int(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => SqlValue::Float(v),
            _ => SqlValue::Text(s.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Whether this value counts as empty for the `*_opt` condition forms.
    pub fn is_empty(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render as an escaped SQL literal.
    ///
    /// Only meant for logging and inspection; execution always binds.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Float(v) if v.is_finite() => v.to_string(),
            SqlValue::Float(v) => quote(&v.to_string()),
            SqlValue::Text(s) => quote(s),
            SqlValue::Uuid(v) => quote(&v.to_string()),
            SqlValue::Timestamp(v) => quote(&v.to_rfc3339()),
            SqlValue::Date(v) => quote(&v.to_string()),
            SqlValue::Json(v) => quote(&v.to_string()),
        }
    }

    /// Convert into a JSON value, used when mapping rows onto types.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(v) => Value::Bool(*v),
            SqlValue::Int(v) => Value::from(*v),
            SqlValue::Float(v) => Value::from(*v),
            SqlValue::Text(s) => Value::String(s.clone()),
            SqlValue::Uuid(v) => Value::String(v.to_string()),
            SqlValue::Timestamp(v) => Value::String(v.to_rfc3339()),
            SqlValue::Date(v) => Value::String(v.to_string()),
            SqlValue::Json(v) => v.clone(),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql_checked(ty, out),
            SqlValue::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            SqlValue::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            SqlValue::Text(s) => s.to_sql_checked(ty, out),
            SqlValue::Uuid(v) => v.to_sql_checked(ty, out),
            SqlValue::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            SqlValue::Date(v) => v.to_sql_checked(ty, out),
            SqlValue::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(v: $ty) -> Self {
                    SqlValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    uuid::Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
    serde_json::Value => Json,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_number_parses_integers_and_floats() {
        assert_eq!(SqlValue::coerce_number("0"), SqlValue::Int(0));
        assert_eq!(SqlValue::coerce_number(" 12 "), SqlValue::Int(12));
        assert_eq!(SqlValue::coerce_number("1.5"), SqlValue::Float(1.5));
    }

    #[test]
    fn coerce_number_keeps_text() {
        assert_eq!(
            SqlValue::coerce_number("N"),
            SqlValue::Text("N".to_string())
        );
        assert_eq!(SqlValue::coerce_number(" "), SqlValue::Text(" ".to_string()));
        assert_eq!(SqlValue::coerce_number("NaN"), SqlValue::Text("NaN".to_string()));
    }

    #[test]
    fn literal_escapes_quotes() {
        assert_eq!(SqlValue::from("O'Hara").to_literal(), "'O''Hara'");
        assert_eq!(SqlValue::from(7_i32).to_literal(), "7");
        assert_eq!(SqlValue::from(true).to_literal(), "TRUE");
        assert_eq!(SqlValue::from(None::<i64>).to_literal(), "NULL");
    }

    #[test]
    fn empty_values() {
        assert!(SqlValue::Null.is_empty());
        assert!(SqlValue::from("").is_empty());
        assert!(!SqlValue::from(0_i64).is_empty());
    }
}
