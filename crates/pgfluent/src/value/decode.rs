//! Column decoding from `tokio_postgres::Row` into [`Value`].

use super::Value;
use crate::error::{OrmError, OrmResult};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// Hex text form of a `bytea` column, `\x` prefixed like the server's output.
fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> OrmResult<Option<T>> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        let name = row
            .columns()
            .get(idx)
            .map_or_else(|| idx.to_string(), |c| c.name().to_string());
        OrmError::decode(name, e.to_string())
    })
}

/// Decode column `idx` of `row` into a scalar.
pub(crate) fn decode_column(row: &Row, idx: usize) -> OrmResult<Value> {
    let column = row
        .columns()
        .get(idx)
        .ok_or_else(|| OrmError::decode(idx.to_string(), "column index out of range"))?;
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(Value::from),
        Type::INT4 => get::<i32>(row, idx)?.map(Value::from),
        Type::INT8 => get::<i64>(row, idx)?.map(Value::Int),
        Type::OID => get::<u32>(row, idx)?.map(Value::from),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(Value::from),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(Value::Float),
        Type::NUMERIC => get::<Decimal>(row, idx)?.map(|d| Value::Text(d.to_string())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, idx)?.map(Value::Text)
        }
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, idx)?.map(|j| Value::Text(j.to_string()))
        }
        Type::TIMESTAMP => get::<chrono::NaiveDateTime>(row, idx)?.map(|t| Value::Text(t.to_string())),
        Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, idx)?
            .map(|t| Value::Text(t.to_rfc3339())),
        Type::DATE => get::<chrono::NaiveDate>(row, idx)?.map(|d| Value::Text(d.to_string())),
        Type::TIME => get::<chrono::NaiveTime>(row, idx)?.map(|t| Value::Text(t.to_string())),
        Type::UUID => get::<uuid::Uuid>(row, idx)?.map(|u| Value::Text(u.to_string())),
        Type::BYTEA => get::<Vec<u8>>(row, idx)?.map(|b| Value::Text(hex(&b))),
        // citext and other text-like extension types
        _ if <String as FromSql<'_>>::accepts(ty) => get::<String>(row, idx)?.map(Value::Text),
        _ => {
            return Err(OrmError::decode(
                column.name(),
                format!("unsupported column type {ty}"),
            ));
        }
    };

    Ok(value.unwrap_or(Value::Null))
}
