use crate::{flags::DecodeFlags, value::document::Document};
use serde::de::{DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};

/// Decodes any self-describing input into [`Document`].
///
/// Nesting beyond `max_depth` containers fails the decode before the input
/// is read any further.
#[derive(Debug, Clone, Copy)]
pub struct DocumentSeed {
    flags: DecodeFlags,
    depth: usize,
    max_depth: usize,
}

impl Default for DocumentSeed {
    fn default() -> Self {
        Self::new(DecodeFlags::empty())
    }
}

impl DocumentSeed {
    pub fn new(flags: DecodeFlags) -> Self {
        Self {
            flags,
            depth: 0,
            max_depth: usize::MAX,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn nested<E>(self) -> std::result::Result<Self, E>
    where
        E: serde::de::Error,
    {
        if self.depth >= self.max_depth {
            return Err(E::custom(format!(
                "maximum depth of {} exceeded",
                self.max_depth
            )));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

impl<'de> DeserializeSeed<'de> for DocumentSeed {
    type Value = Document;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentVisitor { seed: self })
    }
}

pub struct DocumentVisitor {
    seed: DocumentSeed,
}

macro_rules! impl_visit {
    ($name:ident, $type:ty => @wide) => {
        fn $name<E>(self, value: $type) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(match i64::try_from(value) {
                Ok(v) => Document::Int(v),
                Err(_) if self.seed.flags.contains(DecodeFlags::BIGINT_AS_STRING) => {
                    Document::String(value.to_string())
                }
                Err(_) => Document::Float(value as f64),
            })
        }
    };
    ($name:ident, $type:ty => $variant:ident) => {
        fn $name<E>(self, value: $type) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Document::$variant(value as _))
        }
    };
}

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("JSON compatible document")
    }

    impl_visit!(visit_bool, bool => Bool);
    impl_visit!(visit_i8, i8 => Int);
    impl_visit!(visit_i16, i16 => Int);
    impl_visit!(visit_i32, i32 => Int);
    impl_visit!(visit_i64, i64 => Int);
    impl_visit!(visit_u8, u8 => Int);
    impl_visit!(visit_u16, u16 => Int);
    impl_visit!(visit_u32, u32 => Int);
    impl_visit!(visit_f32, f32 => Float);
    impl_visit!(visit_f64, f64 => Float);
    impl_visit!(visit_u64, u64 => @wide);
    impl_visit!(visit_i128, i128 => @wide);
    impl_visit!(visit_u128, u128 => @wide);

    fn visit_char<E>(self, value: char) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Document::String(value.to_string()))
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Document::String(value.to_owned()))
    }

    fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Document::String(value))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Document::String(String::from_utf8_lossy(value).into_owned()))
    }

    fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Document::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.seed.deserialize(deserializer)
    }

    fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Document::Null)
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.seed.deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let seed = self.seed.nested::<A::Error>()?;
        let mut result = Vec::with_capacity(access.size_hint().unwrap_or_default());
        while let Some(v) = access.next_element_seed(seed)? {
            result.push(v);
        }
        Ok(Document::Sequence(result))
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let seed = self.seed.nested::<A::Error>()?;
        let mut result = Document::Record(Vec::with_capacity(
            access.size_hint().unwrap_or_default(),
        ));
        while let Some(k) = access.next_key::<String>()? {
            let v = access.next_value_seed(seed)?;
            // later duplicates replace earlier ones in place
            result.set(k, v);
        }
        Ok(result)
    }
}
