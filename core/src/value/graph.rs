use crate::{
    error::*,
    reflect::{Reflect, TypeDescriptor, Typed},
};
use std::{
    any::Any,
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// Runtime value of an object graph.
#[derive(Debug, Default, Clone)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Byte string that may not be valid UTF-8.
    Bytes(Vec<u8>),
    /// (values: [value])
    List(Vec<Self>),
    /// Ordered associative collection.
    /// (values: [(key, value)])
    Map(Vec<(String, Self)>),
    Object(ObjectRef),
    /// Opaque runtime resource, never serialized.
    Handle(Rc<dyn Any>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Handle(_) => "handle",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, Self)]> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Reads field of the object this value points to.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Self::Object(v) => v.get(name),
            Self::Map(v) => v.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        graph_eq(self, other, &mut vec![])
    }
}

/// Structural equality; pairs of objects already under comparison are
/// assumed equal so cyclic graphs terminate.
fn graph_eq(a: &Value, b: &Value, visiting: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bytes(a), Value::Bytes(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| graph_eq(a, b, visiting))
        }
        (Value::Map(a), Value::Map(b)) => fields_eq(a, b, visiting),
        (Value::Object(a), Value::Object(b)) => {
            if a.ptr_eq(b) {
                return true;
            }
            let key = (a.id(), b.id());
            if visiting.contains(&key) {
                return true;
            }
            visiting.push(key);
            let a = a.borrow();
            let b = b.borrow();
            match (&*a, &*b) {
                (Object::Generic(a), Object::Generic(b)) => fields_eq(a, b, visiting),
                (Object::Instance(a), Object::Instance(b)) => {
                    let descriptor = a.type_descriptor();
                    descriptor == b.type_descriptor()
                        && descriptor.instance_fields().all(|field| {
                            match (a.field(field.name), b.field(field.name)) {
                                (Some(a), Some(b)) => graph_eq(&a, &b, visiting),
                                (None, None) => true,
                                _ => false,
                            }
                        })
                }
                _ => false,
            }
        }
        (Value::Handle(a), Value::Handle(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Key order does not matter.
fn fields_eq(
    a: &[(String, Value)],
    b: &[(String, Value)],
    visiting: &mut Vec<(usize, usize)>,
) -> bool {
    a.len() == b.len()
        && a.iter().all(|(key, a)| {
            b.iter()
                .find(|(k, _)| k == key)
                .map(|(_, b)| graph_eq(a, b, visiting))
                .unwrap_or_default()
        })
}

macro_rules! impl_from_wrap {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Self::$variant(v as _)
            }
        }
    };
}

impl From<()> for Value {
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

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}

/// Object storage: either untyped record or typed instance.
pub enum Object {
    Generic(Vec<(String, Value)>),
    Instance(Box<dyn Reflect>),
}

impl Object {
    pub fn descriptor(&self) -> Option<&'static TypeDescriptor> {
        match self {
            Self::Generic(_) => None,
            Self::Instance(v) => Some(v.type_descriptor()),
        }
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Self::Generic(v) => v.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()),
            Self::Instance(v) => v.field(name),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        match self {
            Self::Generic(v) => {
                if let Some((_, item)) = v.iter_mut().find(|(k, _)| k == name) {
                    *item = value;
                } else {
                    v.push((name.to_owned(), value));
                }
                Ok(())
            }
            Self::Instance(v) => v.set_field(name, value),
        }
    }

    pub fn as_instance(&self) -> Option<&dyn Reflect> {
        match self {
            Self::Generic(_) => None,
            Self::Instance(v) => Some(v.as_ref()),
        }
    }

    pub fn as_instance_mut(&mut self) -> Option<&mut dyn Reflect> {
        match self {
            Self::Generic(_) => None,
            Self::Instance(v) => Some(v.as_mut()),
        }
    }

    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Reflect,
    {
        self.as_instance().and_then(|v| v.downcast_ref())
    }

    pub fn downcast_mut<T>(&mut self) -> Option<&mut T>
    where
        T: Reflect,
    {
        match self {
            Self::Generic(_) => None,
            Self::Instance(v) => v.downcast_mut(),
        }
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic(v) => f
                .debug_map()
                .entries(v.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::Instance(v) => {
                let descriptor = v.type_descriptor();
                let mut result = f.debug_struct(descriptor.name);
                for field in descriptor.visible_fields() {
                    result.field(field.name, &v.field(field.name));
                }
                result.finish()
            }
        }
    }
}

/// Shared handle to an object. Identity is the allocation itself.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Empty untyped record.
    pub fn generic() -> Self {
        Self::new(Object::Generic(vec![]))
    }

    pub fn generic_from<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: ToString,
        V: Into<Value>,
    {
        Self::new(Object::Generic(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        ))
    }

    pub fn instance<T>(value: T) -> Self
    where
        T: Reflect,
    {
        Self::new(Object::Instance(Box::new(value)))
    }

    /// Blank instance of given type.
    pub fn allocate(descriptor: &TypeDescriptor) -> Self {
        Self::new(Object::Instance(descriptor.allocate_blank()))
    }

    pub fn blank<T>() -> Self
    where
        T: Typed,
    {
        Self::instance(T::blank())
    }

    /// Identity token, valid only while this object is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    pub fn descriptor(&self) -> Option<&'static TypeDescriptor> {
        self.borrow().descriptor()
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.descriptor().map(|descriptor| descriptor.name)
    }

    pub fn is_generic(&self) -> bool {
        self.borrow().is_generic()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.borrow().get(name)
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.borrow_mut().set(name, value.into())
    }

    /// Fields of an untyped record, `None` for typed instances.
    pub fn generic_fields(&self) -> Option<Vec<(String, Value)>> {
        match &*self.borrow() {
            Object::Generic(v) => Some(v.clone()),
            Object::Instance(_) => None,
        }
    }

    /// Runs `f` on the instance when it is of type `T`.
    pub fn with<T, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R>
    where
        T: Reflect,
    {
        self.borrow().downcast_ref::<T>().map(f)
    }

    pub fn with_mut<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Reflect,
    {
        self.borrow_mut().downcast_mut::<T>().map(f)
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(
                f,
                "ObjectRef({} @ {:#x})",
                object
                    .descriptor()
                    .map(|descriptor| descriptor.name)
                    .unwrap_or("generic"),
                self.id()
            ),
            Err(_) => write!(f, "ObjectRef(<borrowed> @ {:#x})", self.id()),
        }
    }
}
