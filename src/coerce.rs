//! Coercion of untyped parse results into caller-declared types.
//!
//! This is a serde `Deserializer` over [`Value`] that never rejects a shape
//! mismatch on its own: a scalar that cannot become the requested type yields
//! that type's zero value, a non-list where a sequence is wanted yields an empty
//! sequence, and a non-map where a record is wanted yields an empty record.
//! Records that should tolerate absent fields carry `#[serde(default)]`.
//!
//! Alternations nested with `match` produce `{Variant: value}` maps, which
//! deserialize directly into Rust enums.
//!
//! ```rust
//! use parsegraph::coerce::from_value;
//! use parsegraph::Value;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, PartialEq)]
//! #[serde(default)]
//! struct Point { x: i32, y: i32, label: Option<String> }
//!
//! let v = Value::map([("x", Value::from("3")), ("y", Value::from("oops"))]);
//! let p: Point = from_value(&v).unwrap();
//! assert_eq!(p, Point { x: 3, y: 0, label: None });
//! ```

use std::fmt;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::{forward_to_deserialize_any, Deserializer};

use crate::errors::{ErrorKind, GrammarError};
use crate::value::Value;

/// Coerces `value` into `T`.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, GrammarError> {
    T::deserialize(ValueDeserializer { value }).map_err(|e| {
        GrammarError::new(ErrorKind::Coercion { message: e.0 })
    })
}

/// Raised only for shapes serde itself cannot default (a required field that is
/// absent, a fixed-size tuple of the wrong length).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError(String);

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CoerceError {}

impl de::Error for CoerceError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CoerceError(msg.to_string())
    }
}

#[derive(Clone, Copy)]
struct ValueDeserializer<'a> {
    value: &'a Value,
}

static EMPTY_LIST: &[Value] = &[];

impl<'a> ValueDeserializer<'a> {
    fn text(&self) -> Option<&'a str> {
        self.value.as_str().map(str::trim)
    }

    fn items(&self) -> &'a [Value] {
        self.value.as_list().unwrap_or(EMPTY_LIST)
    }

    fn entries(&self) -> Vec<(&'a String, &'a Value)> {
        self.value
            .as_map()
            .map(|map| map.iter().collect())
            .unwrap_or_default()
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
                let parsed = self.text().and_then(|s| s.parse::<$ty>().ok());
                visitor.$visit(parsed.unwrap_or_default())
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for ValueDeserializer<'a> {
    type Error = CoerceError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::String(s) => visitor.visit_str(s),
            Value::List(_) => self.deserialize_seq(visitor),
            Value::Map(_) => self.deserialize_map(visitor),
        }
    }

    deserialize_parsed! {
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        let c = self.value.as_str().and_then(|s| s.chars().next());
        visitor.visit_char(c.unwrap_or_default())
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        visitor.visit_str(self.value.as_str().unwrap_or_default())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        visitor.visit_bytes(self.value.as_str().unwrap_or_default().as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CoerceError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CoerceError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        visitor.visit_seq(ListAccess {
            items: self.items().iter(),
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, CoerceError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, CoerceError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        visitor.visit_map(EntryAccess {
            entries: self.entries().into_iter(),
            pending: None,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CoerceError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CoerceError> {
        match self.value {
            Value::String(tag) => visitor.visit_enum(tag.as_str().into_deserializer()),
            Value::Map(map) if map.len() == 1 => {
                let (tag, content) = map.iter().next().ok_or_else(|| {
                    <CoerceError as de::Error>::custom("empty map for enum")
                })?;
                visitor.visit_enum(VariantDeserializer { tag, content })
            }
            other => Err(de::Error::custom(format!(
                "expected a string or a one-entry map for an enum, got {}",
                other.type_name()
            ))),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CoerceError> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! { i128 u128 }
}

struct ListAccess<'a> {
    items: std::slice::Iter<'a, Value>,
}

impl<'de, 'a> SeqAccess<'de> for ListAccess<'a> {
    type Error = CoerceError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, CoerceError> {
        self.items
            .next()
            .map(|value| seed.deserialize(ValueDeserializer { value }))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct EntryAccess<'a> {
    entries: std::vec::IntoIter<(&'a String, &'a Value)>,
    pending: Option<&'a Value>,
}

impl<'de, 'a> MapAccess<'de> for EntryAccess<'a> {
    type Error = CoerceError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, CoerceError> {
        match self.entries.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(key.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, CoerceError> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| <CoerceError as de::Error>::custom("value requested before key"))?;
        seed.deserialize(ValueDeserializer { value })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

struct VariantDeserializer<'a> {
    tag: &'a String,
    content: &'a Value,
}

impl<'de, 'a> EnumAccess<'de> for VariantDeserializer<'a> {
    type Error = CoerceError;
    type Variant = ValueDeserializer<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant), CoerceError> {
        let tag = seed.deserialize(self.tag.as_str().into_deserializer())?;
        Ok((tag, ValueDeserializer { value: self.content }))
    }
}

impl<'de, 'a> VariantAccess<'de> for ValueDeserializer<'a> {
    type Error = CoerceError;

    fn unit_variant(self) -> Result<(), CoerceError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, CoerceError> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, CoerceError> {
        self.deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CoerceError> {
        self.deserialize_map(visitor)
    }
}
