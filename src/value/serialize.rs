use serde::ser::{Error as _, Serialize, SerializeSeq, Serializer};

use super::{Payload, Variant};

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.payload() {
            None | Some(Payload::Void) => serializer.serialize_none(),
            Some(Payload::Bool(v)) => serializer.serialize_bool(*v),
            Some(Payload::Int32(v)) => serializer.serialize_i32(*v),
            Some(Payload::UInt32(v)) => serializer.serialize_u32(*v),
            Some(Payload::Int64(v)) => serializer.serialize_i64(*v),
            Some(Payload::UInt64(v)) => serializer.serialize_u64(*v),
            Some(Payload::Float(v)) => serializer.serialize_f32(*v),
            Some(Payload::Double(v)) => serializer.serialize_f64(*v),
            Some(Payload::String(v)) => serializer.serialize_str(v),
            Some(Payload::DateTime(v)) => v.serialize(serializer),
            Some(Payload::Array(items)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Some(Payload::Object(_)) => Err(S::Error::custom("object variants are not serializable")),
        }
    }
}
