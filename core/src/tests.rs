#![cfg(test)]

use crate::{
    de::{json::decode, rehydrator::Rehydrator},
    flags::{DecodeFlags, SerializeFlags, DEFAULT_MAX_DEPTH},
    ser::walker::Walker,
    Document, Error, Mapping, ObjectRef, Reflect, Result, TypeDirectory, Typed, Value,
    TYPE_TAG_KEY,
};
use serde_json::json;
use std::collections::BTreeMap;

use crate as serde_graph;

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Item")]
struct Item {
    pub v: i64,
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Everything")]
struct Everything {
    pub flag: bool,
    pub number: i32,
    pub big: i64,
    pub ratio: f64,
    pub text: String,
    pub list: Vec<i64>,
    pub names: BTreeMap<String, String>,
    pub maybe: Option<String>,
    pub child: Option<ObjectRef>,
    pub items: Vec<ObjectRef>,
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Node")]
struct Node {
    pub name: String,
    pub next: Option<ObjectRef>,
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Base")]
struct Base {
    pub id: i64,
    pub(crate) shared: String,
    secret: String,
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Derived")]
struct Derived {
    #[reflect(base)]
    base: Base,
    pub extra: bool,
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Profile")]
struct Profile {
    pub nickname: Option<String>,
    pub age: i64,
    #[reflect(default = "\"kept\".to_owned()")]
    pub bio: String,
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Credentials", field_filter = "hidden")]
struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    fn hidden(&self) -> Vec<String> {
        vec!["password".to_owned()]
    }
}

#[derive(Debug, Reflect)]
#[reflect(
    name = "tests::Color",
    serialize_hook = "to_document",
    deserialize_hook = "from_document"
)]
struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    fn to_document(&self) -> Result<Document> {
        Ok(Document::sequence().item(self.r).item(self.g).item(self.b))
    }

    fn from_document(&mut self, record: &Document) -> Result<()> {
        let channel = |key: &str| {
            record
                .get(key)
                .and_then(|value| value.as_int())
                .unwrap_or_default() as u8
        };
        self.r = channel("0");
        self.g = channel("1");
        self.b = channel("2");
        Ok(())
    }
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Broken", serialize_hook = "broken")]
struct Broken {
    pub x: i32,
}

impl Broken {
    fn broken(&self) -> Result<Document> {
        Ok(Document::Int(self.x as i64))
    }
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Counter", after_hydrate = "recount")]
struct Counter {
    pub items: Vec<i64>,
    #[reflect(skip)]
    total: i64,
}

impl Counter {
    fn recount(&mut self) {
        self.total = self.items.iter().sum();
    }
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Ready", after_hydrate = "wake")]
struct Ready {
    pub v: i64,
    #[reflect(default = "Some(\"unset\".to_owned())")]
    pub label: Option<String>,
    #[reflect(skip)]
    ready: bool,
}

impl Ready {
    fn wake(&mut self) {
        self.ready = true;
    }
}

#[derive(Debug, Reflect)]
#[reflect(name = "tests::Wide")]
struct Wide {
    pub n: u64,
    pub small: usize,
}

fn directory() -> TypeDirectory {
    TypeDirectory::new()
        .with::<Item>()
        .with::<Everything>()
        .with::<Node>()
        .with::<Base>()
        .with::<Derived>()
        .with::<Profile>()
        .with::<Credentials>()
        .with::<Color>()
        .with::<Counter>()
        .with::<Ready>()
        .with::<Wide>()
}

fn everything() -> Everything {
    Everything {
        flag: true,
        number: -3,
        big: 1 << 40,
        ratio: 1.5,
        text: "hello".to_owned(),
        list: vec![1, 2, 3],
        names: BTreeMap::from([("a".to_owned(), "x".to_owned())]),
        maybe: None,
        child: Some(ObjectRef::instance(Item { v: 5 })),
        items: vec![
            ObjectRef::instance(Item { v: 1 }),
            ObjectRef::instance(Item { v: 2 }),
        ],
    }
}

fn walk(value: impl Into<Value>) -> Document {
    Walker::default().walk(&value.into()).unwrap()
}

fn rehydrate(document: &Document) -> Value {
    Rehydrator::new(&directory()).rehydrate(document).unwrap()
}

fn rehydrate_mapped(text: &str, mapping: &Mapping) -> Value {
    let document = decode(text, DEFAULT_MAX_DEPTH, DecodeFlags::empty()).unwrap();
    Rehydrator::new(&directory())
        .mapping(mapping)
        .rehydrate(&document)
        .unwrap()
}

fn has_type_tag(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(fields) => {
            fields.contains_key(TYPE_TAG_KEY) || fields.values().any(has_type_tag)
        }
        serde_json::Value::Array(items) => items.iter().any(has_type_tag),
        _ => false,
    }
}

#[test]
fn test_round_trip() {
    crate::register::<Everything>();
    crate::register::<Item>();
    let original = Value::Object(ObjectRef::instance(everything()));
    let serialized = crate::serialize(&original).unwrap();
    let json = serde_json::from_str::<serde_json::Value>(&serialized).unwrap();
    assert_eq!(json[TYPE_TAG_KEY], "tests::Everything");
    assert_eq!(json["child"], json!({TYPE_TAG_KEY: "tests::Item", "v": 5}));
    assert_eq!(json["names"], json!({"a": "x"}));
    assert_eq!(json["maybe"], serde_json::Value::Null);

    let deserialized = crate::deserialize(&serialized).unwrap();
    assert_eq!(deserialized, original);
    let object = deserialized.as_object().unwrap();
    assert_eq!(object.type_name(), Some("tests::Everything"));
    let child = object
        .with::<Everything, _>(|value| value.child.clone())
        .unwrap()
        .unwrap();
    assert_eq!(child.with::<Item, _>(|item| item.v), Some(5));
}

#[test]
fn test_scalars_and_collections() {
    let value = Value::List(vec![
        Value::Null,
        Value::Bool(false),
        Value::Int(-7),
        Value::Float(0.25),
        Value::from("text"),
        Value::Map(vec![("k".to_owned(), Value::Int(1))]),
        Value::Handle(std::rc::Rc::new(42u8)),
    ]);
    let document = walk(value);
    assert_eq!(
        document,
        Document::from([
            Document::Null,
            Document::Bool(false),
            Document::Int(-7),
            Document::Float(0.25),
            Document::from("text"),
            Document::record().field("k", 1),
            Document::Null,
        ])
    );
    let restored = rehydrate(&document);
    let items = restored.as_list().unwrap();
    assert_eq!(items[2], Value::Int(-7));
    assert!(items[5].as_object().unwrap().is_generic());
    assert_eq!(items[5].get("k"), Some(Value::Int(1)));
}

#[test]
fn test_cycle_truncation() {
    let a = ObjectRef::generic_from([("name", "a")]);
    let b = ObjectRef::generic_from([("parent", a.clone())]);
    a.set("child", b).unwrap();
    let serialized = crate::serialize(&Value::Object(a)).unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&serialized).unwrap(),
        json!({"name": "a", "child": {"parent": null}})
    );

    let restored = rehydrate_mapped(&serialized, &Mapping::new());
    assert_eq!(
        restored.get("child").unwrap().get("parent"),
        Some(Value::Null)
    );

    let mapping = Mapping::from_pairs([("child/parent", "rf:")]).unwrap();
    let restored = rehydrate_mapped(&serialized, &mapping);
    let parent = restored.get("child").unwrap().get("parent").unwrap();
    assert!(parent
        .as_object()
        .unwrap()
        .ptr_eq(restored.as_object().unwrap()));
}

#[test]
fn test_typed_self_loop() {
    let node = ObjectRef::instance(Node {
        name: "loop".to_owned(),
        next: None,
    });
    node.with_mut::<Node, _>(|value| value.next = Some(node.clone()));
    let document = walk(node.clone());
    assert_eq!(
        document,
        Document::tagged("tests::Node")
            .field("name", "loop")
            .field("next", ())
    );
    // walking shared but acyclic objects duplicates them
    let shared = ObjectRef::generic_from([("v", 1)]);
    let document = walk(Value::List(vec![
        Value::Object(shared.clone()),
        Value::Object(shared),
    ]));
    assert_eq!(
        document,
        Document::from([
            Document::record().field("v", 1),
            Document::record().field("v", 1)
        ])
    );
    node.with_mut::<Node, _>(|value| value.next = None);
}

#[test]
fn test_field_scope_narrowing() {
    assert!(Derived::descriptor().is_subtype_of(Base::descriptor()));
    assert!(!Base::descriptor().is_subtype_of(Derived::descriptor()));
    let derived = ObjectRef::instance(Derived {
        base: Base {
            id: 1,
            shared: "shared".to_owned(),
            secret: "secret".to_owned(),
        },
        extra: true,
    });
    let document = walk(derived);
    assert_eq!(
        document,
        Document::tagged("tests::Derived")
            .field("extra", true)
            .field("id", 1)
            .field("shared", "shared")
    );
    let base = walk(ObjectRef::instance(Base {
        id: 1,
        shared: "shared".to_owned(),
        secret: "secret".to_owned(),
    }));
    assert_eq!(base.get("secret"), Some(&Document::from("secret")));

    let restored = rehydrate(&document.field("secret", "injected"));
    let object = restored.as_object().unwrap();
    assert_eq!(
        object.with::<Derived, _>(|value| (
            value.base.id,
            value.base.shared.clone(),
            value.base.secret.clone()
        )),
        Some((1, "shared".to_owned(), String::new()))
    );
}

#[test]
fn test_skip_class_name() {
    let original = Value::Object(ObjectRef::instance(everything()));
    let serialized =
        crate::ser::json::to_string_with(&original, SerializeFlags::SKIP_CLASS_NAME, 16).unwrap();
    let json = serde_json::from_str::<serde_json::Value>(&serialized).unwrap();
    assert!(!has_type_tag(&json));
    assert!(has_type_tag(
        &serde_json::from_str::<serde_json::Value>(&crate::serialize(&original).unwrap())
            .unwrap()
    ));

    let restored = rehydrate_mapped(&serialized, &Mapping::new());
    let object = restored.as_object().unwrap();
    assert!(object.is_generic());
    assert!(restored.get("child").unwrap().as_object().unwrap().is_generic());
    let items = restored.get("items").unwrap();
    assert!(items.as_list().unwrap()[0].as_object().unwrap().is_generic());
}

#[test]
fn test_wildcard_mapping() {
    let mapping = Mapping::from_pairs([("list/*", "cl:tests::Item")]).unwrap();
    let restored = rehydrate_mapped(r#"{"list":[{"v":1},{"v":2},{"v":3}]}"#, &mapping);
    let list = restored.get("list").unwrap();
    let values = list
        .as_list()
        .unwrap()
        .iter()
        .map(|item| item.as_object().unwrap().with::<Item, _>(|item| item.v))
        .collect::<Vec<_>>();
    assert_eq!(values, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_self_reference_via_mapping() {
    let x = ObjectRef::generic_from([("name", "x")]);
    let b = ObjectRef::generic_from([("owner", x.clone())]);
    let root = ObjectRef::generic_from([("a", x), ("b", b)]);
    let serialized = crate::serialize(&Value::Object(root)).unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&serialized).unwrap(),
        json!({"a": {"name": "x"}, "b": {"owner": {"name": "x"}}})
    );

    let mapping =
        Mapping::from_pairs([("", "object"), ("b", "object"), ("b/owner", "rf:a")]).unwrap();
    let restored = rehydrate_mapped(&serialized, &mapping);
    let a = restored.get("a").unwrap();
    let owner = restored.get("b").unwrap().get("owner").unwrap();
    assert!(owner.as_object().unwrap().ptr_eq(a.as_object().unwrap()));

    // reference to a path that is not built yet resolves to nothing
    let mapping = Mapping::from_pairs([("a", "rf:b")]).unwrap();
    let restored = rehydrate_mapped(&serialized, &mapping);
    assert_eq!(restored.get("a"), Some(Value::Null));
}

#[test]
fn test_scalar_coercion() {
    let mapping = Mapping::from_pairs([
        ("a", "?int"),
        ("b", "?int"),
        ("c", "bool"),
        ("d", "float"),
        ("e", "string"),
        ("f", "null"),
        ("g", "int"),
    ])
    .unwrap();
    let restored = rehydrate_mapped(
        r#"{"a":"23232","b":null,"c":10,"d":"12.5kg","e":2.5,"f":[1],"g":null}"#,
        &mapping,
    );
    assert_eq!(restored.get("a"), Some(Value::Int(23232)));
    assert_eq!(restored.get("b"), Some(Value::Null));
    assert_eq!(restored.get("c"), Some(Value::Bool(true)));
    assert_eq!(restored.get("d"), Some(Value::Float(12.5)));
    assert_eq!(restored.get("e"), Some(Value::from("2.5")));
    assert_eq!(restored.get("f"), Some(Value::Null));
    assert_eq!(restored.get("g"), Some(Value::Int(0)));

    let document = decode(r#"{"e":[1]}"#, DEFAULT_MAX_DEPTH, DecodeFlags::empty()).unwrap();
    let mapping = Mapping::from_pairs([("e", "string")]).unwrap();
    assert_eq!(
        Rehydrator::new(&directory())
            .mapping(&mapping)
            .rehydrate(&document),
        Err(Error::StructuralMismatch {
            path: "e".to_owned(),
            expected: "string convertible value",
            found: "sequence",
        })
    );
}

#[test]
fn test_container_coercion() {
    let mapping = Mapping::from_pairs([
        ("a", "array"),
        ("b", "array"),
        ("c", "array"),
        ("d", "object"),
        ("e", "object"),
        ("f", "object"),
        ("g", "cl:tests::Item"),
        ("h", "cl:tests::Unknown"),
        ("h/v", "int"),
    ])
    .unwrap();
    let restored = rehydrate_mapped(
        r#"{
            "a": 5,
            "b": {"CL_-=_-=": "tests::Item", "v": 1},
            "c": null,
            "d": "text",
            "e": [1, 2],
            "f": null,
            "g": {"CL_-=_-=": "tests::Node", "v": 4},
            "h": {"v": "7"}
        }"#,
        &mapping,
    );
    assert_eq!(restored.get("a"), Some(Value::List(vec![Value::Int(5)])));
    assert_eq!(
        restored.get("b"),
        Some(Value::Map(vec![("v".to_owned(), Value::Int(1))]))
    );
    assert_eq!(restored.get("c"), Some(Value::List(vec![])));
    let d = restored.get("d").unwrap();
    assert_eq!(d.get("scalar"), Some(Value::from("text")));
    let e = restored.get("e").unwrap();
    assert_eq!(e.get("1"), Some(Value::Int(2)));
    let f = restored.get("f").unwrap();
    assert_eq!(f.as_object().unwrap().generic_fields(), Some(vec![]));
    let g = restored.get("g").unwrap();
    assert_eq!(g.as_object().unwrap().with::<Item, _>(|item| item.v), Some(4));
    let h = restored.get("h").unwrap();
    assert!(h.as_object().unwrap().is_generic());
    assert_eq!(h.get("v"), Some(Value::Int(7)));

    let document = decode(r#"{"g":[1]}"#, DEFAULT_MAX_DEPTH, DecodeFlags::empty()).unwrap();
    assert!(matches!(
        Rehydrator::new(&directory())
            .mapping(&mapping)
            .rehydrate(&document),
        Err(Error::StructuralMismatch { path, .. }) if path == "g"
    ));
}

#[test]
fn test_missing_key_under_mapping() {
    let mut profile = Profile {
        nickname: Some("old".to_owned()),
        age: 30,
        bio: "bio".to_owned(),
    };
    let document = Document::tagged("tests::Profile");
    let mapping = Mapping::from_pairs([("nickname", "?string"), ("age", "int")]).unwrap();
    Rehydrator::new(&directory())
        .mapping(&mapping)
        .rehydrate_into(&document, &mut profile)
        .unwrap();
    assert_eq!(profile.nickname, None);
    assert_eq!(profile.age, 0);
    assert_eq!(profile.bio, "bio");

    // without mapping absent fields keep their blank values
    let object = Rehydrator::new(&directory())
        .rehydrate_as(&Document::record().field("age", 3), Profile::descriptor())
        .unwrap();
    assert_eq!(
        object.with::<Profile, _>(|value| (value.nickname.clone(), value.age, value.bio.clone())),
        Some((None, 3, "kept".to_owned()))
    );
}

#[test]
fn test_hooks() {
    let credentials = || {
        Value::Object(ObjectRef::instance(Credentials {
            user: "admin".to_owned(),
            password: "hunter2".to_owned(),
        }))
    };
    assert_eq!(
        Walker::default().walk(&credentials()).unwrap(),
        Document::tagged("tests::Credentials").field("user", "admin")
    );
    assert_eq!(
        Walker::new(SerializeFlags::SKIP_MAGIC_METHODS)
            .walk(&credentials())
            .unwrap(),
        Document::tagged("tests::Credentials")
            .field("user", "admin")
            .field("password", "hunter2")
    );

    let color = Value::Object(ObjectRef::instance(Color { r: 1, g: 2, b: 3 }));
    let document = Walker::default().walk(&color).unwrap();
    assert_eq!(
        document,
        Document::record()
            .field("0", 1)
            .field("1", 2)
            .field("2", 3)
            .field(TYPE_TAG_KEY, "tests::Color")
    );
    let restored = rehydrate(&document);
    assert_eq!(restored, color);
    assert_eq!(
        Walker::new(SerializeFlags::SKIP_MAGIC_METHODS | SerializeFlags::SKIP_CLASS_NAME)
            .walk(&color)
            .unwrap(),
        Document::record().field("r", 1).field("g", 2).field("b", 3)
    );

    assert_eq!(
        Walker::default().walk(&Value::Object(ObjectRef::instance(Broken { x: 1 }))),
        Err(Error::HookContractViolation {
            type_name: "tests::Broken".to_owned(),
            hook: "serialize",
        })
    );

    assert_eq!(
        Counter::descriptor()
            .instance_fields()
            .map(|field| field.name)
            .collect::<Vec<_>>(),
        vec!["items"]
    );
    let counter = ObjectRef::instance(Counter {
        items: vec![1, 2, 3],
        total: 6,
    });
    let document = walk(counter);
    assert_eq!(document.get("total"), None);
    let restored = rehydrate(&document);
    assert_eq!(
        restored
            .as_object()
            .unwrap()
            .with::<Counter, _>(|value| value.total),
        Some(6)
    );
}

#[test]
fn test_object_to_string() {
    let inner = ObjectRef::generic_from([("name", "inner")]);
    let root = ObjectRef::generic_from([("name", Value::from("root")), ("inner", inner.into())]);
    let serialized = crate::serialize_object(
        &Value::Object(root),
        &["name"],
        SerializeFlags::empty(),
        DEFAULT_MAX_DEPTH,
    )
    .unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&serialized).unwrap(),
        json!({"inner": {"name": "inner"}})
    );
    assert!(matches!(
        crate::serialize_object(
            &Value::Int(1),
            &[],
            SerializeFlags::empty(),
            DEFAULT_MAX_DEPTH
        ),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_sanitize() {
    let value = Value::Object(ObjectRef::generic_from([(
        "data",
        Value::Bytes(vec![b'a', 0xff, b'b']),
    )]));
    let serialized = crate::serialize(&value).unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&serialized).unwrap(),
        json!({"data": "a\u{FFFD}b"})
    );
    assert!(matches!(
        crate::ser::json::to_string_with(&value, SerializeFlags::SKIP_SANITIZE, DEFAULT_MAX_DEPTH),
        Err(Error::EncodingFailure(_))
    ));
    let valid = Value::Bytes(b"ok".to_vec());
    assert_eq!(
        crate::ser::json::to_string_with(&valid, SerializeFlags::SKIP_SANITIZE, DEFAULT_MAX_DEPTH)
            .unwrap(),
        "\"ok\""
    );
    assert!(matches!(
        crate::serialize(&Value::Float(f64::NAN)),
        Err(Error::EncodingFailure(_))
    ));
}

#[test]
fn test_pretty_print() {
    let value = Value::Object(ObjectRef::generic_from([("a", 1)]));
    assert_eq!(
        crate::ser::json::to_string_pretty(&value).unwrap(),
        "{\n  \"a\": 1\n}"
    );
}

#[test]
fn test_depth_limit() {
    let nested = Value::List(vec![Value::List(vec![Value::List(vec![Value::List(
        vec![Value::Int(1)],
    )])])]);
    assert_eq!(
        Walker::default().max_depth(3).walk(&nested),
        Err(Error::DepthLimitExceeded(3))
    );
    assert!(Walker::default().max_depth(4).walk(&nested).is_ok());

    assert_eq!(
        decode("[[[[1]]]]", 3, DecodeFlags::empty()),
        Err(Error::DepthLimitExceeded(3))
    );
    let document = decode("[[[[1]]]]", 4, DecodeFlags::empty()).unwrap();
    assert_eq!(document.depth(), 4);
    assert_eq!(
        Rehydrator::new(&directory())
            .max_depth(2)
            .rehydrate(&document),
        Err(Error::DepthLimitExceeded(2))
    );
    let deep = format!("{}{}", "[".repeat(200), "]".repeat(200));
    assert_eq!(
        crate::de::json::from_str_with(&deep, 64, DecodeFlags::empty()),
        Err(Error::DepthLimitExceeded(64))
    );
    assert!(crate::de::json::from_str_with(&deep, 200, DecodeFlags::empty()).is_ok());
}

#[test]
fn test_decoding() {
    assert!(matches!(
        crate::deserialize("{\"v\":"),
        Err(Error::DecodingFailure(_))
    ));
    assert!(matches!(
        crate::deserialize("{} trailing"),
        Err(Error::DecodingFailure(_))
    ));
    assert_eq!(
        decode("[42,-1]", 8, DecodeFlags::empty()),
        Ok(Document::from([Document::Int(42), Document::Int(-1)]))
    );
    assert_eq!(
        decode("9223372036854775807", 8, DecodeFlags::BIGINT_AS_STRING),
        Ok(Document::Int(i64::MAX))
    );
    assert_eq!(
        decode("18446744073709551615", 8, DecodeFlags::BIGINT_AS_STRING),
        Ok(Document::from("18446744073709551615"))
    );
    assert_eq!(
        decode("18446744073709551615", 8, DecodeFlags::empty()),
        Ok(Document::Float(18446744073709551615.0))
    );
    assert_eq!(
        decode(r#"{"a":1,"a":2}"#, 8, DecodeFlags::empty()),
        Ok(Document::record().field("a", 2))
    );
}

#[test]
fn test_wide_integers() {
    crate::register::<Wide>();
    let original = Value::Object(ObjectRef::instance(Wide {
        n: u64::MAX,
        small: 7,
    }));
    let document = walk(original.clone());
    assert_eq!(document.get("n"), Some(&Document::Float(u64::MAX as f64)));
    assert_eq!(document.get("small"), Some(&Document::Int(7)));

    let serialized = crate::serialize(&original).unwrap();
    let restored = crate::deserialize(&serialized).unwrap();
    assert_eq!(
        restored
            .as_object()
            .unwrap()
            .with::<Wide, _>(|value| (value.n, value.small)),
        Some((u64::MAX, 7))
    );

    let document = Document::tagged("tests::Wide").field("n", -1);
    assert!(matches!(
        Rehydrator::new(&directory()).rehydrate(&document),
        Err(Error::StructuralMismatch { .. })
    ));
    let document = Document::tagged("tests::Wide").field("small", 1.5);
    assert!(matches!(
        Rehydrator::new(&directory()).rehydrate(&document),
        Err(Error::StructuralMismatch { .. })
    ));
}

#[test]
fn test_instance_directive_on_null() {
    let mapping = Mapping::from_pairs([
        ("a", "cl:tests::Ready"),
        ("b", "cl:tests::Ready"),
        ("a/label", "?string"),
    ])
    .unwrap();
    let restored = rehydrate_mapped(r#"{"a":null,"b":{"v":1}}"#, &mapping);
    let state = |key: &str| {
        restored
            .get(key)
            .unwrap()
            .as_object()
            .unwrap()
            .with::<Ready, _>(|value| (value.v, value.label.clone(), value.ready))
    };
    assert_eq!(state("a"), Some((0, None, true)));
    assert_eq!(state("b"), Some((1, Some("unset".to_owned()), true)));

    let mapping = Mapping::from_pairs([("a", "?cl:tests::Ready")]).unwrap();
    let restored = rehydrate_mapped(r#"{"a":null}"#, &mapping);
    assert_eq!(restored.get("a"), Some(Value::Null));
}

#[test]
fn test_unknown_type() {
    let restored = crate::deserialize(r#"{"CL_-=_-=":"tests::Missing","v":1}"#).unwrap();
    let object = restored.as_object().unwrap();
    assert!(object.is_generic());
    assert_eq!(
        object.generic_fields(),
        Some(vec![("v".to_owned(), Value::Int(1))])
    );
}

#[test]
fn test_field_mismatch() {
    let document = Document::tagged("tests::Item").field("v", "text");
    assert_eq!(
        Rehydrator::new(&directory()).rehydrate(&document),
        Err(Error::StructuralMismatch {
            path: "v".to_owned(),
            expected: "i64",
            found: "string",
        })
    );
}

#[test]
fn test_deserialize_into() {
    let item = ObjectRef::instance(Item { v: 1 });
    let result = crate::deserialize_into(
        r#"{"v":9}"#,
        &item,
        DEFAULT_MAX_DEPTH,
        DecodeFlags::empty(),
    )
    .unwrap();
    assert!(result.ptr_eq(&item));
    assert_eq!(item.with::<Item, _>(|item| item.v), Some(9));
    assert!(matches!(
        crate::deserialize_into("[1]", &item, DEFAULT_MAX_DEPTH, DecodeFlags::empty()),
        Err(Error::StructuralMismatch { .. })
    ));

    let mut instance = Item { v: 0 };
    crate::de::json::from_str_into_instance(
        r#"{"v":4}"#,
        &mut instance,
        DEFAULT_MAX_DEPTH,
        DecodeFlags::empty(),
    )
    .unwrap();
    assert_eq!(instance.v, 4);

    let object = crate::de::json::from_str_as::<Item>(r#"{"CL_-=_-=":"tests::Node","v":3}"#)
        .unwrap();
    assert_eq!(object.with::<Item, _>(|item| item.v), Some(3));
    assert_eq!(
        object.set("missing", 1),
        Err(Error::UnknownField {
            type_name: "tests::Item",
            field: "missing".to_owned(),
        })
    );
}

#[test]
fn test_directory() {
    let directory = directory();
    assert!(directory.is_registered::<Item>());
    assert_eq!(directory.resolve("tests::Item"), Some(Item::descriptor()));
    assert_eq!(directory.resolve("tests::Nothing"), None);
    let mut directory = TypeDirectory::new().with::<Item>();
    directory.unregister::<Item>();
    assert!(directory.is_empty());
    let blank = ObjectRef::allocate(Item::descriptor());
    assert_eq!(blank.get("v"), Some(Value::Int(0)));
    assert_eq!(blank.descriptor().map(|d| d.name), Some("tests::Item"));
}
