pub mod de;
pub mod directory;
pub mod error;
pub mod flags;
pub mod mapping;
pub mod reflect;
pub mod ser;
pub mod value;

#[cfg(test)]
mod tests;

pub use crate::{
    de::json::{
        from_str as deserialize, from_str_into as deserialize_into,
        from_str_mapped as deserialize_with_mapping,
    },
    directory::{register, TypeDirectory},
    error::{Error, Result},
    mapping::{Directive, Mapping},
    reflect::{FieldInfo, FieldValue, HookSet, Reflect, TypeDescriptor, Typed, Visibility},
    ser::json::{object_to_string as serialize_object, to_string as serialize},
    value::{
        document::{Document, TYPE_TAG_KEY},
        graph::{Object, ObjectRef, Value},
    },
};
#[cfg(feature = "derive")]
pub use serde_graph_derive::Reflect;
