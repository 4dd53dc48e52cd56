use crate::ast::AstNode;
use crate::complex::Complex;
use crate::config::Config;
use crate::time::DateTime;
use hashlink::LinkedHashMap;
use smol_str::SmolStr;
use std::fmt;

/// An evaluated mapping; insertion order is preserved because merge
/// semantics and interpolation make iteration order observable.
pub type ValueMap = LinkedHashMap<SmolStr, Value>;

/// An evaluated configuration value. The `Internal*` variants hold
/// still-unevaluated AST and exist only while evaluation is in flight; the
/// query surface unwraps them before returning.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Complex(Complex),
    Bool(bool),
    None,
    String(String),
    DateTime(DateTime),
    List(Vec<Value>),
    Mapping(ValueMap),
    Config(Config),
    InternalList(Vec<AstNode>),
    InternalMapping(LinkedHashMap<SmolStr, AstNode>),
}

impl Value {
    /// The kind word used in error messages (`cannot add Integer and
    /// String`, `invalid container for slicing: Mapping`, …).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Complex(_) => "Complex",
            Value::Bool(_) => "Boolean",
            Value::None => "NoneValue",
            Value::String(_) => "String",
            Value::DateTime(_) => "DateTime",
            Value::List(_) | Value::InternalList(_) => "List",
            Value::Mapping(_) | Value::InternalMapping(_) => "Mapping",
            Value::Config(_) => "Config",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// The textual form used by `${...}` interpolation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Complex(z) => write!(f, "{z}"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::None => write!(f, "null"),
            Value::String(s) => write!(f, "{s}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Mapping(map) => {
                let rendered: Vec<String> =
                    map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Config(_) => write!(f, "<configuration>"),
            Value::InternalList(_) | Value::InternalMapping(_) => write!(f, "<unevaluated>"),
        }
    }
}
