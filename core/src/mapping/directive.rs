use crate::error::*;
use pest::Parser;
use pest_derive::Parser;
use std::{fmt::Display, str::FromStr};

#[derive(Parser)]
#[grammar = "mapping/directive.pest"]
struct DirectiveParser;

/// Native type a mapped value is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    Null,
}

impl ScalarKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "bool" | "boolean" => Some(Self::Bool),
            "int" | "integer" => Some(Self::Int),
            "float" | "double" => Some(Self::Float),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Scalar(ScalarKind),
    /// `cl:<type name>`
    Instance(String),
    /// `rf:<path>`, empty path points at the document root.
    Reference(String),
}

/// Parsed type directive of a mapped path.
///
/// # Example
/// ```rust
/// use serde_graph::mapping::{Directive, ScalarKind, Target};
///
/// let directive = "?int".parse::<Directive>().unwrap();
/// assert!(directive.nullable);
/// assert_eq!(directive.target, Target::Scalar(ScalarKind::Int));
/// assert_eq!(directive.to_string(), "?int");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Directive {
    /// `Null` input short-circuits to `Null`.
    pub nullable: bool,
    pub target: Target,
}

impl Directive {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            nullable: false,
            target: Target::Scalar(kind),
        }
    }

    pub fn instance(type_name: impl ToString) -> Self {
        Self {
            nullable: false,
            target: Target::Instance(type_name.to_string()),
        }
    }

    pub fn reference(path: impl ToString) -> Self {
        Self {
            nullable: false,
            target: Target::Reference(path.to_string()),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn parse(spec: &str) -> Result<Self> {
        let ast = DirectiveParser::parse(Rule::main, spec)
            .map_err(|error| Error::Mapping {
                path: Default::default(),
                reason: format!("malformed directive `{}`: {}", spec, error),
            })?
            .next()
            .ok_or_else(|| Error::Mapping {
                path: Default::default(),
                reason: format!("empty directive `{}`", spec),
            })?;
        let mut nullable = false;
        let mut target = None;
        for pair in ast.into_inner() {
            match pair.as_rule() {
                Rule::nullable => nullable = true,
                Rule::class => {
                    let name = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                    target = Some(Target::Instance(name.to_owned()));
                }
                Rule::reference => {
                    let path = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                    target = Some(Target::Reference(path.to_owned()));
                }
                Rule::scalar => {
                    let kind =
                        ScalarKind::from_keyword(pair.as_str()).ok_or_else(|| Error::Mapping {
                            path: Default::default(),
                            reason: format!("unknown scalar type `{}`", pair.as_str()),
                        })?;
                    target = Some(Target::Scalar(kind));
                }
                _ => {}
            }
        }
        match target {
            Some(target) => Ok(Self { nullable, target }),
            None => Err(Error::Mapping {
                path: Default::default(),
                reason: format!("directive `{}` has no type", spec),
            }),
        }
    }
}

impl FromStr for Directive {
    type Err = Error;

    fn from_str(spec: &str) -> Result<Self> {
        Self::parse(spec)
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "?")?;
        }
        match &self.target {
            Target::Scalar(kind) => write!(f, "{}", kind.keyword()),
            Target::Instance(name) => write!(f, "cl:{}", name),
            Target::Reference(path) => write!(f, "rf:{}", path),
        }
    }
}
