use crate::{
    error::*,
    flags::{SerializeFlags, DEFAULT_MAX_DEPTH},
    reflect::{HookSet, Reflect},
    value::{
        document::{Document, TYPE_TAG_KEY},
        graph::{Object, ObjectRef, Value},
    },
};
use tracing::trace;

/// Identities of objects on the path from the walked root to current node.
#[derive(Debug, Default)]
pub struct AncestorGuard {
    stack: Vec<usize>,
}

impl AncestorGuard {
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.stack.contains(&object.id())
    }

    pub fn enter(&mut self, object: &ObjectRef) {
        self.stack.push(object.id());
    }

    pub fn leave(&mut self) {
        self.stack.pop();
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Converts object graph into [`Document`].
///
/// Back edges of cycles become `Null`, shared but acyclic objects are
/// written once per occurrence.
///
/// # Example
/// ```rust
/// use serde_graph::{ser::walker::Walker, flags::SerializeFlags, Document, ObjectRef, Value};
///
/// let object = ObjectRef::generic_from([("a", 1)]);
/// object.set("self", object.clone()).unwrap();
/// let document = Walker::new(SerializeFlags::empty())
///     .walk(&Value::Object(object))
///     .unwrap();
/// assert_eq!(document, Document::record().field("a", 1).field("self", ()));
/// ```
#[derive(Debug, Clone)]
pub struct Walker {
    flags: SerializeFlags,
    skip_fields: Vec<String>,
    max_depth: usize,
}

impl Default for Walker {
    fn default() -> Self {
        Self::new(SerializeFlags::empty())
    }
}

impl Walker {
    pub fn new(flags: SerializeFlags) -> Self {
        Self {
            flags,
            skip_fields: vec![],
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Fields left out of the root object.
    pub fn skip_fields<T>(mut self, names: impl IntoIterator<Item = T>) -> Self
    where
        T: ToString,
    {
        self.skip_fields
            .extend(names.into_iter().map(|name| name.to_string()));
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn walk(&self, value: &Value) -> Result<Document> {
        let mut guard = AncestorGuard::default();
        match value {
            Value::Object(object) => self.walk_object(object, &mut guard, 0, true),
            value => self.walk_value(value, &mut guard, 0),
        }
    }

    fn magic(&self) -> bool {
        !self.flags.contains(SerializeFlags::SKIP_MAGIC_METHODS)
    }

    fn tagged(&self) -> bool {
        !self.flags.contains(SerializeFlags::SKIP_CLASS_NAME)
    }

    fn enter_container(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            Err(Error::DepthLimitExceeded(self.max_depth))
        } else {
            Ok(())
        }
    }

    fn walk_value(&self, value: &Value, guard: &mut AncestorGuard, depth: usize) -> Result<Document> {
        Ok(match value {
            Value::Null | Value::Handle(_) => Document::Null,
            Value::Bool(v) => Document::Bool(*v),
            Value::Int(v) => Document::Int(*v),
            Value::Float(v) => Document::Float(*v),
            Value::String(v) => Document::String(v.to_owned()),
            Value::Bytes(v) => Document::Bytes(v.to_owned()),
            Value::List(items) => {
                self.enter_container(depth)?;
                Document::Sequence(
                    items
                        .iter()
                        .map(|item| self.walk_value(item, guard, depth + 1))
                        .collect::<Result<_>>()?,
                )
            }
            Value::Map(entries) => {
                self.enter_container(depth)?;
                let mut result = Document::Record(Vec::with_capacity(entries.len()));
                for (key, item) in entries {
                    result.set(key, self.walk_value(item, guard, depth + 1)?);
                }
                result
            }
            Value::Object(object) => self.walk_object(object, guard, depth, false)?,
        })
    }

    fn walk_object(
        &self,
        object: &ObjectRef,
        guard: &mut AncestorGuard,
        depth: usize,
        root: bool,
    ) -> Result<Document> {
        if guard.contains(object) {
            trace!(
                "cycle broken at {:?} after {} ancestors",
                object,
                guard.depth()
            );
            return Ok(Document::Null);
        }
        self.enter_container(depth)?;
        let borrowed = object.borrow();
        guard.enter(object);
        let result = match &*borrowed {
            Object::Generic(fields) => {
                let mut result = Vec::with_capacity(fields.len());
                for (key, item) in fields {
                    if root && self.skip_fields.contains(key) {
                        continue;
                    }
                    result.push((key.to_owned(), self.walk_value(item, guard, depth + 1)?));
                }
                Document::Record(result)
            }
            Object::Instance(instance) => {
                self.walk_instance(instance.as_ref(), guard, depth, root)?
            }
        };
        guard.leave();
        Ok(result)
    }

    fn walk_instance(
        &self,
        instance: &dyn Reflect,
        guard: &mut AncestorGuard,
        depth: usize,
        root: bool,
    ) -> Result<Document> {
        let descriptor = instance.type_descriptor();
        if self.magic() && descriptor.has_hook(HookSet::SERIALIZE) {
            let mut result = match instance.serialize_hook()? {
                result @ Document::Record(_) => result,
                Document::Sequence(items) => Document::Record(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| (index.to_string(), item))
                        .collect(),
                ),
                _ => {
                    return Err(Error::HookContractViolation {
                        type_name: descriptor.name.to_owned(),
                        hook: "serialize",
                    })
                }
            };
            if self.tagged() {
                result.set(TYPE_TAG_KEY, descriptor.name);
            }
            return Ok(result);
        }
        let mut excluded = if self.magic() && descriptor.has_hook(HookSet::FIELD_FILTER) {
            instance.excluded_fields()
        } else {
            vec![]
        };
        if root {
            excluded.extend(self.skip_fields.iter().cloned());
        }
        let mut result = Vec::with_capacity(descriptor.fields.len() + 1);
        if self.tagged() {
            result.push((
                TYPE_TAG_KEY.to_owned(),
                Document::String(descriptor.name.to_owned()),
            ));
        }
        for field in descriptor.instance_fields() {
            if excluded.iter().any(|name| name == field.name) {
                continue;
            }
            let value = instance
                .field(field.name)
                .ok_or_else(|| Error::UnknownField {
                    type_name: descriptor.name,
                    field: field.name.to_owned(),
                })?;
            result.push((
                field.name.to_owned(),
                self.walk_value(&value, guard, depth + 1)?,
            ));
        }
        Ok(Document::Record(result))
    }
}
