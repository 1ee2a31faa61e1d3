use std::error::Error;

use chrono::NaiveDateTime;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::error::SqlConnectorError;
use crate::value::{DateTime, Variant};

fn naive(v: &Variant) -> Result<NaiveDateTime, SqlConnectorError> {
    v.value::<DateTime>()?
        .as_naive()
        .ok_or_else(|| SqlConnectorError::ParameterError("invalid date-time".to_string()))
}

/// The server tells us the declared type of every parameter, so the variant is
/// converted to that type with [`Variant::value`] before encoding. A void
/// variant binds NULL.
impl ToSql for Variant {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if !self.valid() {
            return Ok(IsNull::Yes);
        }
        match *ty {
            Type::BOOL => self.value::<bool>()?.to_sql(ty, out),
            Type::CHAR => self.value::<i8>()?.to_sql(ty, out),
            Type::INT2 => self.value::<i16>()?.to_sql(ty, out),
            Type::INT4 => self.value::<i32>()?.to_sql(ty, out),
            Type::INT8 => self.value::<i64>()?.to_sql(ty, out),
            Type::OID => self.value::<u32>()?.to_sql(ty, out),
            Type::FLOAT4 => self.value::<f32>()?.to_sql(ty, out),
            Type::FLOAT8 => self.value::<f64>()?.to_sql(ty, out),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                self.value::<String>()?.to_sql(ty, out)
            }
            Type::TIMESTAMP => naive(self)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => naive(self)?.and_utc().to_sql(ty, out),
            Type::DATE => naive(self)?.date().to_sql(ty, out),
            _ => Err(Box::new(SqlConnectorError::ParameterError(format!(
                "cannot bind a {} variant to postgres type {ty}",
                self.variant_type()
            )))),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::CHAR
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::OID
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
        )
    }

    to_sql_checked!();
}
