#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless
)]

use super::{DateTime, ObjectRef, Payload, Variant};
use crate::error::SqlConnectorError;

/// Conversion out of a [`Variant`], used by [`Variant::value`].
///
/// | target | accepted source tags |
/// |---|---|
/// | `bool` | any arithmetic tag, via "nonzero" |
/// | integers, `f32`, `f64` | any arithmetic tag, via `as` casts (no range checks) |
/// | `String` | arithmetic tags, `String`, `DateTime` |
/// | `&str` | `String` |
/// | [`DateTime`] | `String` (ISO-8601), `DateTime` |
/// | [`ObjectRef`] | `Object`, while the object has not been extracted |
/// | `Vec<Variant>`, `&[Variant]` | `Array` |
/// | `()` | `Void` |
///
/// Every other combination fails with `SqlConnectorError::InvalidConversion`.
pub trait FromVariant<'a>: Sized {
    /// # Errors
    /// Returns `SqlConnectorError` if the variant's payload cannot become `Self`.
    fn from_variant(variant: &'a Variant) -> Result<Self, SqlConnectorError>;
}

fn mismatch(variant: &Variant, target: &'static str) -> SqlConnectorError {
    SqlConnectorError::InvalidConversion {
        from: variant.variant_type(),
        target,
    }
}

impl FromVariant<'_> for bool {
    fn from_variant(variant: &Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::Bool(v)) => Ok(*v),
            Some(Payload::Int32(v)) => Ok(*v != 0),
            Some(Payload::UInt32(v)) => Ok(*v != 0),
            Some(Payload::Int64(v)) => Ok(*v != 0),
            Some(Payload::UInt64(v)) => Ok(*v != 0),
            Some(Payload::Float(v)) => Ok(*v != 0.0),
            Some(Payload::Double(v)) => Ok(*v != 0.0),
            _ => Err(mismatch(variant, "bool")),
        }
    }
}

macro_rules! arithmetic_from_variant {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromVariant<'_> for $ty {
                fn from_variant(variant: &Variant) -> Result<Self, SqlConnectorError> {
                    match variant.payload() {
                        Some(Payload::Bool(v)) => Ok(u8::from(*v) as $ty),
                        Some(Payload::Int32(v)) => Ok(*v as $ty),
                        Some(Payload::UInt32(v)) => Ok(*v as $ty),
                        Some(Payload::Int64(v)) => Ok(*v as $ty),
                        Some(Payload::UInt64(v)) => Ok(*v as $ty),
                        Some(Payload::Float(v)) => Ok(*v as $ty),
                        Some(Payload::Double(v)) => Ok(*v as $ty),
                        _ => Err(mismatch(variant, stringify!($ty))),
                    }
                }
            }
        )*
    };
}

arithmetic_from_variant!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl FromVariant<'_> for String {
    fn from_variant(variant: &Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::Bool(v)) => Ok(v.to_string()),
            Some(Payload::Int32(v)) => Ok(v.to_string()),
            Some(Payload::UInt32(v)) => Ok(v.to_string()),
            Some(Payload::Int64(v)) => Ok(v.to_string()),
            Some(Payload::UInt64(v)) => Ok(v.to_string()),
            Some(Payload::Float(v)) => Ok(v.to_string()),
            Some(Payload::Double(v)) => Ok(v.to_string()),
            Some(Payload::String(v)) => Ok(v.clone()),
            Some(Payload::DateTime(v)) => v.to_iso_string(),
            _ => Err(mismatch(variant, "String")),
        }
    }
}

impl<'a> FromVariant<'a> for &'a str {
    fn from_variant(variant: &'a Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::String(v)) => Ok(v.as_str()),
            _ => Err(mismatch(variant, "&str")),
        }
    }
}

impl FromVariant<'_> for DateTime {
    fn from_variant(variant: &Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::String(v)) => DateTime::from_iso_string(v),
            Some(Payload::DateTime(v)) => Ok(*v),
            _ => Err(mismatch(variant, "DateTime")),
        }
    }
}

impl<'a> FromVariant<'a> for ObjectRef<'a> {
    fn from_variant(variant: &'a Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::Object(slot)) => slot.borrow().ok_or_else(|| {
                SqlConnectorError::ConversionError("object was already extracted".to_string())
            }),
            _ => Err(mismatch(variant, "Object")),
        }
    }
}

impl FromVariant<'_> for Vec<Variant> {
    fn from_variant(variant: &Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::Array(items)) => Ok(items.clone()),
            _ => Err(mismatch(variant, "Array")),
        }
    }
}

impl<'a> FromVariant<'a> for &'a [Variant] {
    fn from_variant(variant: &'a Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            Some(Payload::Array(items)) => Ok(items.as_slice()),
            _ => Err(mismatch(variant, "Array")),
        }
    }
}

impl FromVariant<'_> for () {
    fn from_variant(variant: &Variant) -> Result<Self, SqlConnectorError> {
        match variant.payload() {
            None | Some(Payload::Void) => Ok(()),
            _ => Err(mismatch(variant, "void")),
        }
    }
}
