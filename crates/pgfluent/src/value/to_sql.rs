//! `ToSql` for [`Value`]: encode a scalar for whatever parameter type the server
//! inferred for its placeholder.

use super::{Value, parse_bool};
use bytes::BytesMut;
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => encode_bool(*b, ty, out),
            Value::Int(i) => encode_int(*i, ty, out),
            Value::Float(f) => encode_float(*f, ty, out),
            Value::Text(s) => encode_text(s, ty, out),
        }
    }

    // Null binds to any column type; non-null values report a mismatch from `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || ty.name() == "citext"
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind {value:?} to a parameter of type {ty}").into()
}

fn encode_bool(b: bool, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => b.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::NUMERIC => encode_int(i64::from(b), ty, out),
        _ if is_text(ty) => (if b { "1" } else { "0" }).to_sql(ty, out),
        _ => Err(mismatch(&Value::Bool(b), ty)),
    }
}

fn encode_int(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::INT8 => i.to_sql(ty, out),
        Type::OID => u32::try_from(i)?.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::BOOL => (i != 0).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(i).to_sql(ty, out),
        _ if is_text(ty) => i.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Int(i), ty)),
    }
}

fn encode_float(f: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(f)
            .map_err(|e| format!("cannot bind {f} to numeric: {e}"))?
            .to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 if f.fract() == 0.0 => encode_int(f as i64, ty, out),
        _ if is_text(ty) => f.to_string().to_sql(ty, out),
        _ => Err(mismatch(&Value::Float(f), ty)),
    }
}

fn encode_text(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        _ if is_text(ty) => s.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            let i: i64 = s
                .trim()
                .parse()
                .map_err(|_| format!("invalid integer literal '{s}' for {ty}"))?;
            encode_int(i, ty, out)
        }
        Type::FLOAT4 | Type::FLOAT8 => {
            let f: f64 = s
                .trim()
                .parse()
                .map_err(|_| format!("invalid float literal '{s}' for {ty}"))?;
            encode_float(f, ty, out)
        }
        Type::NUMERIC => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .map_err(|_| format!("invalid numeric literal '{s}'"))?
            .to_sql(ty, out),
        Type::BOOL => {
            let b = parse_bool(s).ok_or_else(|| format!("invalid boolean literal '{s}'"))?;
            b.to_sql(ty, out)
        }
        Type::JSON | Type::JSONB => {
            let json: serde_json::Value = serde_json::from_str(s)?;
            json.to_sql(ty, out)
        }
        Type::TIMESTAMP => parse_naive_datetime(s)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_datetime_utc(s)?.to_sql(ty, out),
        Type::DATE => s.trim().parse::<chrono::NaiveDate>()?.to_sql(ty, out),
        Type::TIME => s.trim().parse::<chrono::NaiveTime>()?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::BYTEA => match s.strip_prefix("\\x") {
            Some(hex) => parse_hex(hex)
                .ok_or_else(|| format!("invalid bytea hex literal '{s}'"))?
                .to_sql(ty, out),
            None => s.as_bytes().to_sql(ty, out),
        },
        _ => Err(mismatch(&Value::Text(s.to_string()), ty)),
    }
}

/// Inverse of the `\x` hex form `bytea` columns decode to.
fn parse_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| hex.get(i..i + 2).and_then(|b| u8::from_str_radix(b, 16).ok()))
        .collect()
}

fn parse_naive_datetime(s: &str) -> Result<chrono::NaiveDateTime, BoxError> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = s.parse::<chrono::NaiveDate>() {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    Err(format!("invalid timestamp literal '{s}'").into())
}

fn parse_datetime_utc(s: &str) -> Result<chrono::DateTime<chrono::Utc>, BoxError> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s.trim()) {
        return Ok(dt.with_timezone(&chrono::Utc));
    }
    // Offset-less input is taken as UTC.
    Ok(parse_naive_datetime(s)?.and_utc())
}
