use crate::{
    directory::TypeDirectory,
    error::*,
    flags::DEFAULT_MAX_DEPTH,
    mapping::{child_path, coerce, Directive, Mapping, MappingState, ScalarKind, Target},
    reflect::{FieldInfo, HookSet, Reflect, TypeDescriptor},
    value::{
        document::{Document, TYPE_TAG_KEY},
        graph::{ObjectRef, Value},
    },
};
use tracing::{debug, trace};

/// Rebuilds object graph from [`Document`].
///
/// Records tagged with a type known to the directory become blank allocated
/// instances of that type, everything else becomes generic objects. With a
/// [`Mapping`] attached, directives override that inference per path.
///
/// # Example
/// ```rust
/// use serde_graph::{de::rehydrator::Rehydrator, Document, Mapping, TypeDirectory, Value};
///
/// let directory = TypeDirectory::new();
/// let mapping = Mapping::from_pairs([("a", "?int"), ("b", "bool")]).unwrap();
/// let document = Document::record().field("a", "42").field("b", 10);
/// let value = Rehydrator::new(&directory)
///     .mapping(&mapping)
///     .rehydrate(&document)
///     .unwrap();
/// assert_eq!(value.get("a"), Some(Value::Int(42)));
/// assert_eq!(value.get("b"), Some(Value::Bool(true)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Rehydrator<'a> {
    directory: &'a TypeDirectory,
    mapping: Option<&'a Mapping>,
    max_depth: usize,
}

impl<'a> Rehydrator<'a> {
    pub fn new(directory: &'a TypeDirectory) -> Self {
        Self {
            directory,
            mapping: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn mapping(mut self, mapping: &'a Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn rehydrate(&self, document: &Document) -> Result<Value> {
        Hydration::new(self).value(document, "", 0)
    }

    /// Rehydrates root record as instance of given type, ignoring its type tag.
    pub fn rehydrate_as(
        &self,
        document: &Document,
        descriptor: &'static TypeDescriptor,
    ) -> Result<ObjectRef> {
        require_record(document, "")?;
        Hydration::new(self).object(document, Some(descriptor), "", 0)
    }

    /// Hydrates fields of an existing instance from root record.
    pub fn rehydrate_into(&self, document: &Document, target: &mut dyn Reflect) -> Result<()> {
        require_record(document, "")?;
        let mut hydration = Hydration::new(self);
        hydration.enter_container(0)?;
        hydration.fill_instance(target, document, "", 0)
    }

    /// Hydrates fields of an existing object from root record. The object
    /// counts as the document root for `rf:` directives.
    pub fn rehydrate_into_object(&self, document: &Document, object: &ObjectRef) -> Result<()> {
        require_record(document, "")?;
        let mut hydration = Hydration::new(self);
        hydration.enter_container(0)?;
        hydration.register(object, "");
        hydration.fill(object, document, "", 0)
    }
}

fn require_record(document: &Document, path: &str) -> Result<()> {
    if document.is_record() {
        Ok(())
    } else {
        Err(Error::mismatch("record", document.kind()).at(path))
    }
}

/// State of a single rehydration call.
struct Hydration<'a> {
    directory: &'a TypeDirectory,
    state: Option<MappingState<'a>>,
    max_depth: usize,
}

impl<'a> Hydration<'a> {
    fn new(rehydrator: &Rehydrator<'a>) -> Self {
        Self {
            directory: rehydrator.directory,
            state: rehydrator.mapping.map(MappingState::new),
            max_depth: rehydrator.max_depth,
        }
    }

    fn enter_container(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            Err(Error::DepthLimitExceeded(self.max_depth))
        } else {
            Ok(())
        }
    }

    fn directive(&self, path: &str) -> Option<&'a Directive> {
        self.state.as_ref().and_then(|state| state.resolve(path))
    }

    fn register(&mut self, object: &ObjectRef, path: &str) {
        if let Some(state) = &mut self.state {
            state.register_constructed(path, object);
        }
    }

    fn resolve_type(&self, name: &str) -> Option<&'static TypeDescriptor> {
        let result = self.directory.resolve(name);
        if result.is_none() {
            debug!("unknown type `{}`, falling back to generic object", name);
        }
        result
    }

    fn value(&mut self, document: &Document, path: &str, depth: usize) -> Result<Value> {
        match self.directive(path) {
            Some(directive) => self.mapped(document, directive, path, depth),
            None => self.inferred(document, path, depth),
        }
    }

    fn inferred(&mut self, document: &Document, path: &str, depth: usize) -> Result<Value> {
        match document {
            Document::Sequence(items) => {
                self.enter_container(depth)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.value(item, &child_path(path, &index.to_string()), depth + 1)
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::List)
            }
            Document::Record(_) => {
                let descriptor = document
                    .type_tag()
                    .and_then(|name| self.resolve_type(name));
                self.object(document, descriptor, path, depth)
                    .map(Value::Object)
            }
            document => Ok(scalar(document)),
        }
    }

    fn mapped(
        &mut self,
        document: &Document,
        directive: &Directive,
        path: &str,
        depth: usize,
    ) -> Result<Value> {
        if directive.nullable && document.is_null() {
            return Ok(Value::Null);
        }
        trace!("applying `{}` at `{}`", directive, path);
        match &directive.target {
            Target::Scalar(kind) => self.coerced(document, *kind, path, depth),
            Target::Instance(name) => {
                let descriptor = self.resolve_type(name);
                match document {
                    // null reads as an empty record
                    Document::Null => self
                        .object(&Document::record(), descriptor, path, depth)
                        .map(Value::Object),
                    Document::Record(_) => self
                        .object(document, descriptor, path, depth)
                        .map(Value::Object),
                    document => Err(Error::mismatch("record", document.kind()).at(path)),
                }
            }
            Target::Reference(target) => {
                let result = self
                    .state
                    .as_ref()
                    .and_then(|state| state.lookup_reference(target));
                match result {
                    Some(object) => Ok(Value::Object(object)),
                    None => {
                        debug!("unresolved reference to `{}` at `{}`", target, path);
                        Ok(Value::Null)
                    }
                }
            }
        }
    }

    fn coerced(
        &mut self,
        document: &Document,
        kind: ScalarKind,
        path: &str,
        depth: usize,
    ) -> Result<Value> {
        Ok(match kind {
            ScalarKind::Bool => Value::Bool(coerce::to_bool(document)),
            ScalarKind::Int => Value::Int(coerce::to_int(document)),
            ScalarKind::Float => Value::Float(coerce::to_float(document)),
            ScalarKind::String => {
                Value::String(coerce::to_string(document).map_err(|error| error.at(path))?)
            }
            ScalarKind::Null => Value::Null,
            ScalarKind::Array => match document {
                Document::Null => Value::List(vec![]),
                Document::Sequence(_) => self.inferred(document, path, depth)?,
                Document::Record(entries) => {
                    self.enter_container(depth)?;
                    let mut result = Vec::with_capacity(entries.len());
                    for (key, item) in entries {
                        if key != TYPE_TAG_KEY {
                            let value = self.value(item, &child_path(path, key), depth + 1)?;
                            result.push((key.to_owned(), value));
                        }
                    }
                    Value::Map(result)
                }
                document => Value::List(vec![scalar(document)]),
            },
            ScalarKind::Object => match document {
                Document::Record(_) => Value::Object(self.object(document, None, path, depth)?),
                Document::Sequence(items) => {
                    self.enter_container(depth)?;
                    let object = ObjectRef::generic();
                    self.register(&object, path);
                    for (index, item) in items.iter().enumerate() {
                        let key = index.to_string();
                        let value = self.value(item, &child_path(path, &key), depth + 1)?;
                        object.set(&key, value)?;
                    }
                    Value::Object(object)
                }
                Document::Null => {
                    self.enter_container(depth)?;
                    let object = ObjectRef::generic();
                    self.register(&object, path);
                    Value::Object(object)
                }
                document => {
                    self.enter_container(depth)?;
                    let object = ObjectRef::generic_from([("scalar", scalar(document))]);
                    self.register(&object, path);
                    Value::Object(object)
                }
            },
        })
    }

    /// Allocates object for a record and fills it. Registered before filling
    /// so nested `rf:` directives can point back at it.
    fn object(
        &mut self,
        document: &Document,
        descriptor: Option<&'static TypeDescriptor>,
        path: &str,
        depth: usize,
    ) -> Result<ObjectRef> {
        self.enter_container(depth)?;
        let object = allocate(descriptor);
        self.register(&object, path);
        self.fill(&object, document, path, depth)?;
        Ok(object)
    }

    fn fill(&mut self, object: &ObjectRef, document: &Document, path: &str, depth: usize) -> Result<()> {
        let entries = match document {
            Document::Record(entries) => entries,
            document => return Err(Error::mismatch("record", document.kind()).at(path)),
        };
        let descriptor = match object.descriptor() {
            Some(descriptor) => descriptor,
            None => {
                for (key, item) in entries {
                    if key != TYPE_TAG_KEY {
                        let value = self.value(item, &child_path(path, key), depth + 1)?;
                        object.set(key, value)?;
                    }
                }
                return Ok(());
            }
        };
        if descriptor.has_hook(HookSet::DESERIALIZE) {
            let mut object = object.borrow_mut();
            return match object.as_instance_mut() {
                Some(instance) => instance.deserialize_hook(document),
                None => Ok(()),
            };
        }
        let values = self.fields(descriptor, document, path, depth)?;
        let mut object = object.borrow_mut();
        match object.as_instance_mut() {
            Some(instance) => apply(instance, values, path),
            None => Ok(()),
        }
    }

    fn fill_instance(
        &mut self,
        instance: &mut dyn Reflect,
        document: &Document,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        let descriptor = instance.type_descriptor();
        if descriptor.has_hook(HookSet::DESERIALIZE) {
            return instance.deserialize_hook(document);
        }
        let values = self.fields(descriptor, document, path, depth)?;
        apply(instance, values, path)
    }

    /// Rehydrated values of instance fields present in the record. Absent
    /// fields are skipped unless their path is mapped, then they read `Null`.
    fn fields(
        &mut self,
        descriptor: &'static TypeDescriptor,
        document: &Document,
        path: &str,
        depth: usize,
    ) -> Result<Vec<(&'static FieldInfo, Value)>> {
        let mut result = vec![];
        for field in descriptor.instance_fields() {
            let field_path = child_path(path, field.name);
            let value = match document.get(field.name) {
                Some(item) => self.value(item, &field_path, depth + 1)?,
                None if self.directive(&field_path).is_some() => {
                    self.value(&Document::Null, &field_path, depth + 1)?
                }
                None => continue,
            };
            result.push((field, value));
        }
        Ok(result)
    }
}

fn allocate(descriptor: Option<&'static TypeDescriptor>) -> ObjectRef {
    match descriptor {
        Some(descriptor) => ObjectRef::allocate(descriptor),
        None => ObjectRef::generic(),
    }
}

fn apply(
    instance: &mut dyn Reflect,
    values: Vec<(&'static FieldInfo, Value)>,
    path: &str,
) -> Result<()> {
    for (field, value) in values {
        instance
            .set_field(field.name, value)
            .map_err(|error| error.at(&child_path(path, field.name)))?;
    }
    if instance.type_descriptor().has_hook(HookSet::AFTER_HYDRATE) {
        instance.after_hydrate();
    }
    Ok(())
}

fn scalar(document: &Document) -> Value {
    match document {
        Document::Null => Value::Null,
        Document::Bool(v) => Value::Bool(*v),
        Document::Int(v) => Value::Int(*v),
        Document::Float(v) => Value::Float(*v),
        Document::String(v) => Value::String(v.to_owned()),
        Document::Bytes(v) => Value::Bytes(v.to_owned()),
        Document::Sequence(_) | Document::Record(_) => Value::Null,
    }
}
