use crate::{
    error::*,
    value::{
        document::Document,
        graph::{ObjectRef, Value},
    },
};
use bitflags::bitflags;
use std::{any::Any, collections::BTreeMap};

/// Declared visibility of a field.
///
/// Private fields of a base type are not visible through derived types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub name: &'static str,
    pub visibility: Visibility,
    /// Class level fields are never serialized nor hydrated.
    pub is_static: bool,
}

impl FieldInfo {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            visibility: Visibility::Public,
            is_static: false,
        }
    }

    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub const fn static_field(mut self) -> Self {
        self.is_static = true;
        self
    }
}

bitflags! {
    /// Optional hooks a reflected type implements.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HookSet: u8 {
        /// [`Reflect::serialize_hook`]
        const SERIALIZE = 1;
        /// [`Reflect::excluded_fields`]
        const FIELD_FILTER = 1 << 1;
        /// [`Reflect::deserialize_hook`]
        const DESERIALIZE = 1 << 2;
        /// [`Reflect::after_hydrate`]
        const AFTER_HYDRATE = 1 << 3;
    }
}

/// Static description of a reflected type.
/// Prefer to produce it using `Reflect` derive macro.
pub struct TypeDescriptor {
    /// Fully qualified name written as type tag.
    pub name: &'static str,
    /// Fields declared on this exact type, in declaration order.
    pub fields: &'static [FieldInfo],
    pub base: Option<fn() -> &'static TypeDescriptor>,
    pub hooks: HookSet,
    /// Creates blank instance without running any user construction logic.
    pub allocate: fn() -> Box<dyn Reflect>,
}

impl TypeDescriptor {
    pub fn base(&self) -> Option<&'static TypeDescriptor> {
        self.base.map(|base| base())
    }

    pub fn has_hook(&self, hook: HookSet) -> bool {
        self.hooks.contains(hook)
    }

    pub fn allocate_blank(&self) -> Box<dyn Reflect> {
        (self.allocate)()
    }

    /// Fields visible on instances of this exact type: own fields followed by
    /// non-private fields of the base chain. Redeclared names keep the most
    /// derived declaration.
    pub fn visible_fields(&self) -> Vec<&'static FieldInfo> {
        let mut result = self.fields.iter().collect::<Vec<_>>();
        let mut base = self.base();
        while let Some(descriptor) = base {
            for field in descriptor.fields {
                if field.visibility != Visibility::Private
                    && !result.iter().any(|f| f.name == field.name)
                {
                    result.push(field);
                }
            }
            base = descriptor.base();
        }
        result
    }

    /// Visible fields taking part in (de)serialization.
    pub fn instance_fields(&self) -> impl Iterator<Item = &'static FieldInfo> {
        self.visible_fields()
            .into_iter()
            .filter(|field| !field.is_static)
    }

    pub fn is_subtype_of(&self, other: &TypeDescriptor) -> bool {
        let mut current = Some(self);
        while let Some(descriptor) = current {
            if descriptor == other {
                return true;
            }
            current = descriptor.base();
        }
        false
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("base", &self.base().map(|base| base.name))
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Trait used to expose fields of typed instances to the walker and rehydrator.
/// Prefer to implement using `Reflect` derive macro.
///
/// # Example
/// ```rust
/// use serde_graph::{Reflect, Typed, ObjectRef, Value};
///
/// #[derive(Debug, Reflect)]
/// #[reflect(name = "demo::Point")]
/// struct Point {
///     pub x: i64,
///     pub y: i64,
/// }
///
/// let point = ObjectRef::instance(Point { x: 1, y: 2 });
/// assert_eq!(point.get("y"), Some(Value::Int(2)));
/// assert_eq!(Point::descriptor().name, "demo::Point");
/// ```
pub trait Reflect: Any {
    fn type_descriptor(&self) -> &'static TypeDescriptor;

    fn field(&self, name: &str) -> Option<Value>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Replaces field walking. Must produce a record or a sequence.
    fn serialize_hook(&self) -> Result<Document> {
        Ok(Document::Null)
    }

    /// Names of fields to leave out when serializing.
    fn excluded_fields(&self) -> Vec<String> {
        vec![]
    }

    /// Replaces field hydration, receives whole record including type tag.
    fn deserialize_hook(&mut self, _record: &Document) -> Result<()> {
        Ok(())
    }

    /// Called once all fields are hydrated. Blank allocation skips any
    /// construction logic, so invariants it establishes belong here.
    fn after_hydrate(&mut self) {}
}

impl dyn Reflect {
    pub fn is<T>(&self) -> bool
    where
        T: Reflect,
    {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Reflect,
    {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T>(&mut self) -> Option<&mut T>
    where
        T: Reflect,
    {
        self.as_any_mut().downcast_mut()
    }
}

/// Statically known reflected type.
pub trait Typed: Reflect + Sized {
    fn descriptor() -> &'static TypeDescriptor;

    /// Instance with every field set to its blank value.
    fn blank() -> Self;
}

/// Conversion between field types and runtime values.
pub trait FieldValue: Sized {
    /// Value of a field right after blank allocation.
    fn blank() -> Self;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

impl FieldValue for Value {
    fn blank() -> Self {
        Value::Null
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FieldValue for bool {
    fn blank() -> Self {
        false
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            value => Err(Error::mismatch("bool", value.kind())),
        }
    }
}

macro_rules! impl_field_integer {
    ($( $type:ty ),+) => {
        $(
            impl FieldValue for $type {
                fn blank() -> Self {
                    0
                }

                fn to_value(&self) -> Value {
                    // widened the same way the decoder widens big integers
                    match i64::try_from(*self) {
                        Ok(v) => Value::Int(v),
                        Err(_) => Value::Float(*self as f64),
                    }
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Int(v) => Self::try_from(v)
                            .map_err(|_| Error::mismatch(stringify!($type), "int out of range")),
                        Value::Float(v)
                            if v.fract() == 0.0
                                && v >= Self::MIN as f64
                                && v <= Self::MAX as f64 =>
                        {
                            Ok(v as Self)
                        }
                        value => Err(Error::mismatch(stringify!($type), value.kind())),
                    }
                }
            }
        )+
    };
}

impl_field_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_field_float {
    ($( $type:ty ),+) => {
        $(
            impl FieldValue for $type {
                fn blank() -> Self {
                    0.0
                }

                fn to_value(&self) -> Value {
                    Value::Float(*self as f64)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Float(v) => Ok(v as _),
                        Value::Int(v) => Ok(v as _),
                        value => Err(Error::mismatch(stringify!($type), value.kind())),
                    }
                }
            }
        )+
    };
}

impl_field_float!(f32, f64);

impl FieldValue for String {
    fn blank() -> Self {
        String::new()
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            Value::Bytes(v) => Ok(String::from_utf8_lossy(&v).into_owned()),
            value => Err(Error::mismatch("string", value.kind())),
        }
    }
}

impl FieldValue for ObjectRef {
    fn blank() -> Self {
        ObjectRef::generic()
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(v) => Ok(v),
            value => Err(Error::mismatch("object", value.kind())),
        }
    }
}

impl<T> FieldValue for Option<T>
where
    T: FieldValue,
{
    fn blank() -> Self {
        None
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<T> FieldValue for Vec<T>
where
    T: FieldValue,
{
    fn blank() -> Self {
        vec![]
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(v) => v.into_iter().map(T::from_value).collect(),
            Value::Map(v) => v.into_iter().map(|(_, v)| T::from_value(v)).collect(),
            value => Err(Error::mismatch("list", value.kind())),
        }
    }
}

impl<T> FieldValue for BTreeMap<String, T>
where
    T: FieldValue,
{
    fn blank() -> Self {
        Default::default()
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_owned(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Map(v) => v,
            // records without type tag come back as generic objects
            Value::Object(object) => object
                .generic_fields()
                .ok_or_else(|| Error::mismatch("map", "instance"))?,
            value => return Err(Error::mismatch("map", value.kind())),
        };
        entries
            .into_iter()
            .map(|(k, v)| Ok((k, T::from_value(v)?)))
            .collect()
    }
}
