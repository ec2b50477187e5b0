use crate::{de::seed::DocumentSeed, flags::DecodeFlags};
use serde::{
    de::DeserializeSeed,
    ser::{Error as _, SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Reserved record key holding the type tag of serialized instances.
///
/// Part of the wire format: never change it within a build.
pub const TYPE_TAG_KEY: &str = "CL_-=_-=";

/// JSON shaped document produced by the walker and consumed by the rehydrator.
#[derive(Debug, Default, Clone, PartialEq, PartialOrd)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Text that was not validated as UTF-8 yet.
    Bytes(Vec<u8>),
    /// (values: [value])
    Sequence(Vec<Self>),
    /// (values: [(key, value)])
    Record(Vec<(String, Self)>),
}

impl Document {
    pub fn sequence() -> Self {
        Self::Sequence(vec![])
    }

    pub fn record() -> Self {
        Self::Record(vec![])
    }

    /// Creates record tagged with given type name.
    pub fn tagged<T>(type_name: T) -> Self
    where
        T: ToString,
    {
        Self::Record(vec![(
            TYPE_TAG_KEY.to_owned(),
            Self::String(type_name.to_string()),
        )])
    }

    pub fn item<T>(mut self, value: T) -> Self
    where
        T: Into<Self>,
    {
        if let Self::Sequence(v) = &mut self {
            v.push(value.into());
        }
        self
    }

    pub fn field<K, T>(mut self, key: K, value: T) -> Self
    where
        K: ToString,
        T: Into<Self>,
    {
        self.set(key, value);
        self
    }

    /// Sets record field, replacing existing value in place.
    pub fn set<K, T>(&mut self, key: K, value: T)
    where
        K: ToString,
        T: Into<Self>,
    {
        if let Self::Record(v) = self {
            let key = key.to_string();
            let value = value.into();
            if let Some((_, item)) = v.iter_mut().find(|(k, _)| k == &key) {
                *item = value;
            } else {
                v.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Record(v) => v.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn type_tag(&self) -> Option<&str> {
        self.get(TYPE_TAG_KEY).and_then(|v| v.as_str())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Sequence(_) => "sequence",
            Self::Record(_) => "record",
        }
    }

    /// Nesting depth: scalars are 0, containers are 1 + their deepest child.
    pub fn depth(&self) -> usize {
        match self {
            Self::Sequence(v) => 1 + v.iter().map(|v| v.depth()).max().unwrap_or_default(),
            Self::Record(v) => 1 + v.iter().map(|(_, v)| v.depth()).max().unwrap_or_default(),
            _ => 0,
        }
    }

    /// Repairs text that cannot be encoded, replacing invalid UTF-8 sequences.
    pub fn sanitized(self) -> Self {
        match self {
            Self::Bytes(v) => match String::from_utf8(v) {
                Ok(v) => Self::String(v),
                Err(error) => {
                    Self::String(String::from_utf8_lossy(error.as_bytes()).into_owned())
                }
            },
            Self::Sequence(v) => Self::Sequence(v.into_iter().map(Self::sanitized).collect()),
            Self::Record(v) => Self::Record(
                v.into_iter()
                    .map(|(k, v)| (k, v.sanitized()))
                    .collect(),
            ),
            value => value,
        }
    }
}

macro_rules! impl_as_copy_value {
    ($method:ident, $type:ty, $variant:ident) => {
        pub fn $method(&self) -> Option<$type> {
            match self {
                Self::$variant(v) => Some(*v),
                _ => None,
            }
        }
    };
}

macro_rules! impl_as_ref_value {
    ($method:ident, $type:ty, $variant:ident) => {
        pub fn $method(&self) -> Option<$type> {
            match self {
                Self::$variant(v) => Some(v),
                _ => None,
            }
        }
    };
}

impl Document {
    impl_as_copy_value! {as_bool, bool, Bool}
    impl_as_copy_value! {as_int, i64, Int}
    impl_as_copy_value! {as_float, f64, Float}
    impl_as_ref_value! {as_str, &str, String}
    impl_as_ref_value! {as_bytes, &[u8], Bytes}
    impl_as_ref_value! {as_sequence, &[Self], Sequence}
    impl_as_ref_value! {as_record, &[(String, Self)], Record}
}

macro_rules! impl_from_wrap {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Document {
            fn from(v: $type) -> Self {
                Self::$variant(v as _)
            }
        }
    };
}

impl From<()> for Document {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl_from_wrap!(bool, Bool);
impl_from_wrap!(i8, Int);
impl_from_wrap!(i16, Int);
impl_from_wrap!(i32, Int);
impl_from_wrap!(i64, Int);
impl_from_wrap!(u8, Int);
impl_from_wrap!(u16, Int);
impl_from_wrap!(u32, Int);
impl_from_wrap!(f32, Float);
impl_from_wrap!(f64, Float);

impl From<String> for Document {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Document {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl<T> From<Option<T>> for Document
where
    T: Into<Document>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}

impl From<Vec<Document>> for Document {
    fn from(v: Vec<Self>) -> Self {
        Self::Sequence(v)
    }
}

impl<const N: usize> From<[Document; N]> for Document {
    fn from(v: [Self; N]) -> Self {
        Self::Sequence(v.to_vec())
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => {
                if !v.is_finite() {
                    return Err(S::Error::custom(format!(
                        "{} cannot be represented in JSON",
                        v
                    )));
                }
                serializer.serialize_f64(*v)
            }
            Self::String(v) => serializer.serialize_str(v),
            Self::Bytes(v) => match std::str::from_utf8(v) {
                Ok(v) => serializer.serialize_str(v),
                Err(error) => Err(S::Error::custom(format!(
                    "malformed UTF-8 characters: {}",
                    error
                ))),
            },
            Self::Sequence(v) => {
                let mut seq = serializer.serialize_seq(Some(v.len()))?;
                for item in v {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(v) => {
                let mut map = serializer.serialize_map(Some(v.len()))?;
                for (k, v) in v {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        DocumentSeed::new(DecodeFlags::empty()).deserialize(deserializer)
    }
}
