//! The dynamic [`Variant`] value carried by query parameters and result rows.
//!
//! Storage is reference counted and copy-on-write: cloning a `Variant` is O(1)
//! and shares the payload until one of the copies is mutated through
//! [`Variant::string_mut`], [`Variant::array_mut`] or [`Variant::set`].
//! Object payloads are the exception: they are exclusively owned by the shared
//! storage, so [`Variant::extract_object`] empties the object for every copy.

mod convert;
mod datetime;
mod object;
mod serialize;

use std::fmt;
use std::sync::Arc;

pub use convert::FromVariant;
pub use datetime::DateTime;
pub use object::{Object, ObjectRef};

use object::ObjectSlot;

use crate::error::SqlConnectorError;

/// Discriminator of the payload held by a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Void,
    Bool,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    DateTime,
    Object,
    Array,
}

impl VariantType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            VariantType::Void => "void",
            VariantType::Bool => "bool",
            VariantType::Int32 => "int32",
            VariantType::UInt32 => "uint32",
            VariantType::Int64 => "int64",
            VariantType::UInt64 => "uint64",
            VariantType::Float => "float",
            VariantType::Double => "double",
            VariantType::String => "string",
            VariantType::DateTime => "datetime",
            VariantType::Object => "object",
            VariantType::Array => "array",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub(crate) enum Payload {
    Void,
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime),
    Object(ObjectSlot),
    Array(Vec<Variant>),
}

impl Payload {
    fn variant_type(&self) -> VariantType {
        match self {
            Payload::Void => VariantType::Void,
            Payload::Bool(_) => VariantType::Bool,
            Payload::Int32(_) => VariantType::Int32,
            Payload::UInt32(_) => VariantType::UInt32,
            Payload::Int64(_) => VariantType::Int64,
            Payload::UInt64(_) => VariantType::UInt64,
            Payload::Float(_) => VariantType::Float,
            Payload::Double(_) => VariantType::Double,
            Payload::String(_) => VariantType::String,
            Payload::DateTime(_) => VariantType::DateTime,
            Payload::Object(_) => VariantType::Object,
            Payload::Array(_) => VariantType::Array,
        }
    }

    /// Copy the concrete payload for a detach. The shared storage itself is
    /// never cloned, and an owned object cannot be duplicated.
    fn clone_payload(&self) -> Result<Payload, SqlConnectorError> {
        Ok(match self {
            Payload::Void => Payload::Void,
            Payload::Bool(v) => Payload::Bool(*v),
            Payload::Int32(v) => Payload::Int32(*v),
            Payload::UInt32(v) => Payload::UInt32(*v),
            Payload::Int64(v) => Payload::Int64(*v),
            Payload::UInt64(v) => Payload::UInt64(*v),
            Payload::Float(v) => Payload::Float(*v),
            Payload::Double(v) => Payload::Double(*v),
            Payload::String(v) => Payload::String(v.clone()),
            Payload::DateTime(v) => Payload::DateTime(*v),
            Payload::Array(v) => Payload::Array(v.clone()),
            Payload::Object(_) => {
                return Err(SqlConnectorError::Unsupported(
                    "object payloads cannot be cloned".to_string(),
                ));
            }
        })
    }
}

/// Borrowed view of a variant's raw payload, used by marshaling code that
/// binds values to mapped fields.
#[derive(Debug)]
pub enum Buffer<'a> {
    Bool(&'a bool),
    Int32(&'a i32),
    UInt32(&'a u32),
    Int64(&'a i64),
    UInt64(&'a u64),
    Float(&'a f32),
    Double(&'a f64),
    String(&'a str),
    DateTime(&'a DateTime),
    /// `None` once the object has been extracted.
    Object(Option<ObjectRef<'a>>),
    Array(&'a [Variant]),
}

/// Dynamically typed value with copy-on-write shared storage.
///
/// ```rust
/// use sql_connector::Variant;
///
/// let v = Variant::from(-5_i32);
/// assert_eq!(v.value::<f64>()?, -5.0);
/// assert_eq!(Variant::from("42").value::<String>()?, "42");
/// assert!(Variant::from("42").value::<i32>().is_err());
/// # Ok::<(), sql_connector::SqlConnectorError>(())
/// ```
#[derive(Clone, Default)]
pub struct Variant {
    data: Option<Arc<Payload>>,
}

impl Variant {
    fn with_payload(payload: Payload) -> Self {
        Self {
            data: Some(Arc::new(payload)),
        }
    }

    /// A void-typed variant. Equivalent to `Variant::default()` except that it
    /// owns storage.
    #[must_use]
    pub fn void() -> Self {
        Self::with_payload(Payload::Void)
    }

    /// Wrap an application object; the variant's storage becomes its sole owner.
    #[must_use]
    pub fn from_object<T: Object>(object: T) -> Self {
        Self::from(Box::new(object) as Box<dyn Object>)
    }

    pub(crate) fn payload(&self) -> Option<&Payload> {
        self.data.as_deref()
    }

    #[must_use]
    pub fn variant_type(&self) -> VariantType {
        self.payload().map_or(VariantType::Void, Payload::variant_type)
    }

    /// True if storage exists and does not hold `Void`.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.variant_type() != VariantType::Void
    }

    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(
            self.variant_type(),
            VariantType::Bool
                | VariantType::Int32
                | VariantType::UInt32
                | VariantType::Int64
                | VariantType::UInt64
        )
    }

    #[must_use]
    pub fn is_floating_point(&self) -> bool {
        matches!(self.variant_type(), VariantType::Float | VariantType::Double)
    }

    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        self.is_integral() || self.is_floating_point()
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.variant_type() == VariantType::String
    }

    #[must_use]
    pub fn is_date_time(&self) -> bool {
        self.variant_type() == VariantType::DateTime
    }

    /// True for object-tagged variants, including ones whose object was extracted.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.variant_type() == VariantType::Object
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.variant_type() == VariantType::Array
    }

    /// True if this is an object variant whose object has not been extracted.
    #[must_use]
    pub fn has_object(&self) -> bool {
        matches!(self.payload(), Some(Payload::Object(slot)) if slot.is_present())
    }

    /// True if both variants share the same storage.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Variant) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert the payload to `T`. See [`FromVariant`] for the conversion matrix.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::InvalidConversion` if the stored type cannot be
    /// converted to `T`.
    pub fn value<'a, T: FromVariant<'a>>(&'a self) -> Result<T, SqlConnectorError> {
        T::from_variant(self)
    }

    /// Raw access to the payload.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` for a void or storageless variant.
    pub fn buffer(&self) -> Result<Buffer<'_>, SqlConnectorError> {
        let payload = self.payload().ok_or_else(invalid_variant)?;
        Ok(match payload {
            Payload::Bool(v) => Buffer::Bool(v),
            Payload::Int32(v) => Buffer::Int32(v),
            Payload::UInt32(v) => Buffer::UInt32(v),
            Payload::Int64(v) => Buffer::Int64(v),
            Payload::UInt64(v) => Buffer::UInt64(v),
            Payload::Float(v) => Buffer::Float(v),
            Payload::Double(v) => Buffer::Double(v),
            Payload::String(v) => Buffer::String(v),
            Payload::DateTime(v) => Buffer::DateTime(v),
            Payload::Object(slot) => Buffer::Object(slot.borrow()),
            Payload::Array(v) => Buffer::Array(v),
            Payload::Void => {
                return Err(SqlConnectorError::ConversionError(
                    "void variant has no buffer".to_string(),
                ));
            }
        })
    }

    /// Take ownership of the contained object.
    ///
    /// The storage is not detached first: every variant sharing it observes the
    /// object as gone afterwards. Only extract from a variant that is not
    /// logically shared unless invalidating all holders is intended. Waits
    /// until every outstanding [`ObjectRef`] to the storage is dropped.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` if the variant is not an object
    /// variant or the object was already extracted.
    pub fn extract_object(&self) -> Result<Box<dyn Object>, SqlConnectorError> {
        self.object_slot()?
            .write()
            .take()
            .ok_or_else(already_extracted)
    }

    /// Like [`extract_object`](Self::extract_object) but downcasts to `T`. On a
    /// type mismatch the object stays in place.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` if there is no object or it is
    /// not a `T`.
    pub fn extract_object_as<T: Object>(&self) -> Result<Box<T>, SqlConnectorError> {
        let mut slot = self.object_slot()?.write();
        let object: &dyn Object = slot.as_deref().ok_or_else(already_extracted)?;
        if !object.as_any().is::<T>() {
            return Err(SqlConnectorError::ConversionError(format!(
                "object is not a {}",
                std::any::type_name::<T>()
            )));
        }
        let object = slot.take().ok_or_else(already_extracted)?;
        object.into_any().downcast::<T>().map_err(|_| {
            SqlConnectorError::ConversionError("object changed type during extraction".to_string())
        })
    }

    /// Replace this variant's storage with `other`'s, leaving former sharers untouched.
    pub fn set(&mut self, other: impl Into<Variant>) {
        *self = other.into();
    }

    /// Mutable access to a string payload, detaching shared storage first.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::InvalidConversion` if this is not a string variant.
    pub fn string_mut(&mut self) -> Result<&mut String, SqlConnectorError> {
        let from = self.variant_type();
        match self.detach()? {
            Payload::String(s) => Ok(s),
            _ => Err(SqlConnectorError::InvalidConversion {
                from,
                target: "&mut String",
            }),
        }
    }

    /// Mutable access to an array payload, detaching shared storage first.
    /// Elements stay shared with the old array until they are mutated themselves.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::InvalidConversion` if this is not an array variant.
    pub fn array_mut(&mut self) -> Result<&mut Vec<Variant>, SqlConnectorError> {
        let from = self.variant_type();
        match self.detach()? {
            Payload::Array(items) => Ok(items),
            _ => Err(SqlConnectorError::InvalidConversion {
                from,
                target: "&mut Vec<Variant>",
            }),
        }
    }

    fn detach(&mut self) -> Result<&mut Payload, SqlConnectorError> {
        let data = self.data.as_mut().ok_or_else(invalid_variant)?;
        if Arc::get_mut(data).is_none() {
            *data = Arc::new(data.clone_payload()?);
        }
        Arc::get_mut(data).ok_or_else(|| {
            SqlConnectorError::Unsupported("variant storage is still shared".to_string())
        })
    }

    fn object_slot(&self) -> Result<&ObjectSlot, SqlConnectorError> {
        match self.payload() {
            Some(Payload::Object(slot)) => Ok(slot),
            _ => Err(SqlConnectorError::ConversionError(format!(
                "cannot extract an object from a {} variant",
                self.variant_type()
            ))),
        }
    }
}

fn invalid_variant() -> SqlConnectorError {
    SqlConnectorError::ConversionError("variant is invalid".to_string())
}

fn already_extracted() -> SqlConnectorError {
    SqlConnectorError::ConversionError("object was already extracted".to_string())
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload() {
            Some(payload) => fmt::Debug::fmt(payload, f),
            None => f.write_str("Void"),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value::<String>() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "<{}>", self.variant_type()),
        }
    }
}

macro_rules! variant_from {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from(v: $ty) -> Self {
                    Variant::with_payload(Payload::$tag(v))
                }
            }
        )*
    };
}

variant_from! {
    bool => Bool,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime => DateTime,
    Vec<Variant> => Array,
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::from(v.to_string())
    }
}

impl From<chrono::NaiveDateTime> for Variant {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Variant::from(DateTime::from(v))
    }
}

impl From<Box<dyn Object>> for Variant {
    fn from(object: Box<dyn Object>) -> Self {
        Variant::with_payload(Payload::Object(ObjectSlot::new(object)))
    }
}

impl From<()> for Variant {
    fn from((): ()) -> Self {
        Variant::void()
    }
}

impl<T: Into<Variant>> From<Option<T>> for Variant {
    fn from(v: Option<T>) -> Self {
        v.map_or_else(Variant::void, Into::into)
    }
}
