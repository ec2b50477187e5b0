use crate::{
    de::{rehydrator::Rehydrator, seed::DocumentSeed},
    directory::TypeDirectory,
    error::*,
    flags::{DecodeFlags, DEFAULT_MAX_DEPTH},
    mapping::Mapping,
    reflect::{Reflect, Typed},
    value::{
        document::Document,
        graph::{ObjectRef, Value},
    },
};
use serde::de::DeserializeSeed;

pub fn from_str(text: &str) -> Result<Value> {
    from_str_with(text, DEFAULT_MAX_DEPTH, DecodeFlags::empty())
}

pub fn from_str_with(text: &str, max_depth: usize, flags: DecodeFlags) -> Result<Value> {
    let document = decode(text, max_depth, flags)?;
    Rehydrator::new(&TypeDirectory::global())
        .max_depth(max_depth)
        .rehydrate(&document)
}

pub fn from_str_mapped(
    text: &str,
    mapping: &Mapping,
    max_depth: usize,
    flags: DecodeFlags,
) -> Result<Value> {
    let document = decode(text, max_depth, flags)?;
    Rehydrator::new(&TypeDirectory::global())
        .mapping(mapping)
        .max_depth(max_depth)
        .rehydrate(&document)
}

/// Hydrates already allocated object, returning it back.
pub fn from_str_into(
    text: &str,
    object: &ObjectRef,
    max_depth: usize,
    flags: DecodeFlags,
) -> Result<ObjectRef> {
    let document = decode(text, max_depth, flags)?;
    Rehydrator::new(&TypeDirectory::global())
        .max_depth(max_depth)
        .rehydrate_into_object(&document, object)?;
    Ok(object.clone())
}

pub fn from_str_into_instance(
    text: &str,
    instance: &mut dyn Reflect,
    max_depth: usize,
    flags: DecodeFlags,
) -> Result<()> {
    let document = decode(text, max_depth, flags)?;
    Rehydrator::new(&TypeDirectory::global())
        .max_depth(max_depth)
        .rehydrate_into(&document, instance)
}

/// Decodes root record as `T` whatever its type tag says.
pub fn from_str_as<T>(text: &str) -> Result<ObjectRef>
where
    T: Typed,
{
    let document = decode(text, DEFAULT_MAX_DEPTH, DecodeFlags::empty())?;
    Rehydrator::new(&TypeDirectory::global()).rehydrate_as(&document, T::descriptor())
}

/// Parses JSON text into [`Document`] without rehydrating it.
pub fn decode(text: &str, max_depth: usize, flags: DecodeFlags) -> Result<Document> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    // depth is bounded by the seed instead
    deserializer.disable_recursion_limit();
    let result = DocumentSeed::new(flags)
        .max_depth(max_depth)
        .deserialize(&mut deserializer)
        .map_err(|error| {
            // the seed raises no data errors other than exceeded depth
            if error.is_data() {
                Error::DepthLimitExceeded(max_depth)
            } else {
                Error::DecodingFailure(error.to_string())
            }
        })?;
    deserializer
        .end()
        .map_err(|error| Error::DecodingFailure(error.to_string()))?;
    Ok(result)
}
