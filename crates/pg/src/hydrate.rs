use super::*;
use bytes::BytesMut;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::SecondsFormat;
use chrono::Utc;
use qlib_core::Row;
use qlib_core::Value;
use rust_decimal::Decimal;
use tokio_postgres::types::FromSql;
use tokio_postgres::types::IsNull;
use tokio_postgres::types::ToSql;
use tokio_postgres::types::Type;
use tokio_postgres::types::to_sql_checked;
use uuid::Uuid;

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPTZ: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Decodes one tokio-postgres row into a [`Row`] sharing `columns`.
pub fn hydrate(row: &tokio_postgres::Row, columns: &Arc<[String]>) -> Result<Row, PgErr> {
    let values = (0..row.len())
        .map(|i| row.try_get::<_, Option<Decoded>>(i))
        .map(|value| value.map(|v| v.map(|d| d.0).unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Row::new(columns.clone(), values))
}

/// One non-null column decoded by its server type.
///
/// Numeric, date, time, timestamp, uuid and json columns are rendered as
/// canonical text; `void` is NULL; anything else without a native
/// [`Value`] counterpart is kept as raw wire bytes.
struct Decoded(Value);

impl<'a> FromSql<'a> for Decoded {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Cause> {
        let value = match *ty {
            Type::VOID => Value::Null,
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::CHAR => Value::Int(i64::from(i8::from_sql(ty, raw)?)),
            Type::INT2 => Value::from(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::from(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::from(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int(i64::from(u32::from_sql(ty, raw)?)),
            Type::FLOAT4 => Value::from(f32::from_sql(ty, raw)?),
            Type::FLOAT8 => Value::from(f64::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Text(Decimal::from_sql(ty, raw)?.to_string()),
            Type::DATE => Value::Text(NaiveDate::from_sql(ty, raw)?.to_string()),
            Type::TIME => Value::Text(NaiveTime::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMP => Value::Text(
                NaiveDateTime::from_sql(ty, raw)?
                    .format(TIMESTAMP)
                    .to_string(),
            ),
            Type::TIMESTAMPTZ => Value::Text(
                DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            Type::UUID => Value::Text(Uuid::from_sql(ty, raw)?.to_string()),
            Type::JSON | Type::JSONB => {
                Value::Text(serde_json::Value::from_sql(ty, raw)?.to_string())
            }
            _ if <String as FromSql>::accepts(ty) => Value::Text(String::from_sql(ty, raw)?),
            _ => Value::Bytes(raw.to_vec()),
        };
        Ok(Self(value))
    }
    fn accepts(_: &Type) -> bool {
        true
    }
}

/// A [`Value`] bound to a statement parameter.
///
/// Integers and floats are narrowed to whatever width the server inferred
/// for the placeholder; out-of-range integers fail instead of wrapping.
/// Text bound to a numeric, temporal, uuid or json placeholder is parsed
/// into that type first.
#[derive(Debug)]
pub struct Param<'a>(pub &'a Value);

impl ToSql for Param<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Cause> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Int(i) => match *ty {
                Type::CHAR => i8::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT2 => i16::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql_checked(ty, out),
                Type::OID => u32::try_from(*i)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::from(*i).to_sql_checked(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql_checked(ty, out),
                Type::NUMERIC => Decimal::try_from(*f)?.to_sql_checked(ty, out),
                _ => f.to_sql_checked(ty, out),
            },
            Value::Text(s) => match *ty {
                Type::NUMERIC => s.parse::<Decimal>()?.to_sql_checked(ty, out),
                Type::DATE => s.parse::<NaiveDate>()?.to_sql_checked(ty, out),
                Type::TIME => s.parse::<NaiveTime>()?.to_sql_checked(ty, out),
                Type::TIMESTAMP => timestamp(s)?.to_sql_checked(ty, out),
                Type::TIMESTAMPTZ => timestamptz(s)?.to_sql_checked(ty, out),
                Type::UUID => s.parse::<Uuid>()?.to_sql_checked(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql_checked(ty, out)
                }
                _ => s.as_str().to_sql_checked(ty, out),
            },
            Value::Bytes(b) => b.as_slice().to_sql_checked(ty, out),
        }
    }
    fn accepts(_: &Type) -> bool {
        true
    }
    to_sql_checked!();
}

/// Accepts both `2024-01-02 03:04:05` and `2024-01-02T03:04:05`.
fn timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP).or_else(|_| s.parse())
}

/// Accepts RFC 3339 and the server's own `2024-01-02 03:04:05+02` output.
fn timestamptz(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, TIMESTAMPTZ))
        .map(|t| t.with_timezone(&Utc))
}
