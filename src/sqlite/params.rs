use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};

use crate::error::SqlConnectorError;
use crate::value::{Payload, Variant};

/// Bind a variant as a SQLite parameter.
///
/// Booleans and integers bind as INTEGER, floats as REAL, strings as TEXT and
/// date-times as canonical `YYYY-MM-DD HH:MM:SS` TEXT. A void variant binds
/// NULL. Objects, arrays, and unsigned values above `i64::MAX` are rejected.
impl ToSql for Variant {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let Some(payload) = self.payload() else {
            return Ok(ToSqlOutput::Owned(Value::Null));
        };
        Ok(match payload {
            Payload::Void => ToSqlOutput::Owned(Value::Null),
            Payload::Bool(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Payload::Int32(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Payload::UInt32(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            Payload::Int64(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Payload::UInt64(v) => {
                let v = i64::try_from(*v).map_err(|_| {
                    conversion_failure(format!("{v} does not fit in a SQLite INTEGER"))
                })?;
                ToSqlOutput::Owned(Value::Integer(v))
            }
            Payload::Float(v) => ToSqlOutput::Owned(Value::Real(f64::from(*v))),
            Payload::Double(v) => ToSqlOutput::Owned(Value::Real(*v)),
            Payload::String(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Payload::DateTime(v) => {
                let text = v
                    .to_iso_string()
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(Value::Text(text))
            }
            Payload::Object(_) | Payload::Array(_) => {
                return Err(conversion_failure(format!(
                    "{} variants cannot be bound as SQLite parameters",
                    self.variant_type()
                )));
            }
        })
    }
}

fn conversion_failure(msg: String) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(SqlConnectorError::ParameterError(msg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DateTime;

    fn bound(v: &Variant) -> Value {
        match v.to_sql().unwrap() {
            ToSqlOutput::Owned(value) => value,
            ToSqlOutput::Borrowed(value) => Value::try_from(value).unwrap(),
            _ => panic!("unexpected output"),
        }
    }

    #[test]
    fn binds_scalars() {
        assert_eq!(bound(&Variant::default()), Value::Null);
        assert_eq!(bound(&Variant::void()), Value::Null);
        assert_eq!(bound(&Variant::from(true)), Value::Integer(1));
        assert_eq!(bound(&Variant::from(-3_i32)), Value::Integer(-3));
        assert_eq!(bound(&Variant::from(7_u64)), Value::Integer(7));
        assert_eq!(bound(&Variant::from(0.5_f32)), Value::Real(0.5));
        assert_eq!(bound(&Variant::from("hi")), Value::Text("hi".into()));
        let dt = DateTime::from_iso_string("2011-05-06 07:08:09").unwrap();
        assert_eq!(
            bound(&Variant::from(dt)),
            Value::Text("2011-05-06 07:08:09".into())
        );
    }

    #[test]
    fn rejects_unbindable_values() {
        assert!(Variant::from(u64::MAX).to_sql().is_err());
        assert!(Variant::from(vec![Variant::from(1)]).to_sql().is_err());
        assert!(Variant::from_object(1_u8).to_sql().is_err());
    }
}
