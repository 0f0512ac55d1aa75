//! Row decoding into [`RowMap`]s and typed mapping.

use crate::error::{JoinError, JoinResult};
use crate::value::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// One result row keyed by output alias.
pub type RowMap = BTreeMap<String, SqlValue>;

fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> JoinResult<Option<T>>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| JoinError::decode(name, e.to_string()))
}

/// Decode every column of `row` into a [`SqlValue`].
pub fn decode_row(row: &Row) -> JoinResult<RowMap> {
    let mut map = RowMap::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value: SqlValue = match *column.type_() {
            Type::BOOL => get::<bool>(row, idx, name)?.into(),
            Type::INT2 => get::<i16>(row, idx, name)?.into(),
            Type::INT4 => get::<i32>(row, idx, name)?.into(),
            Type::INT8 => get::<i64>(row, idx, name)?.into(),
            Type::FLOAT4 => get::<f32>(row, idx, name)?.into(),
            Type::FLOAT8 => get::<f64>(row, idx, name)?.into(),
            Type::UUID => get::<uuid::Uuid>(row, idx, name)?.into(),
            Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx, name)?.into(),
            Type::TIMESTAMP => get::<NaiveDateTime>(row, idx, name)?
                .map(|v| v.and_utc())
                .into(),
            Type::DATE => get::<NaiveDate>(row, idx, name)?.into(),
            Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, name)?.into(),
            _ => get::<String>(row, idx, name)?.into(),
        };
        map.insert(name.to_string(), value);
    }
    Ok(map)
}

/// Map a row onto `T` by output alias.
pub fn from_row_map<T: DeserializeOwned>(row: RowMap) -> JoinResult<T> {
    let object: serde_json::Map<String, serde_json::Value> = row
        .into_iter()
        .map(|(k, v)| (k, v.to_json()))
        .collect();
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}
