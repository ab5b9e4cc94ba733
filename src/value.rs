use std::{
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::ast::Literal;

/// Insertion-ordered table; later inserts of an existing key overwrite the
/// value in place.
pub type Table = IndexMap<Value, Value>;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Bool(value))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::new(ValueKind::Integer(value.into()))
    }

    pub fn decimal(value: BigDecimal) -> Self {
        Self::new(ValueKind::Decimal(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String(value.into()))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Self::new(ValueKind::List(values))
    }

    pub fn table(entries: Table) -> Self {
        Self::new(ValueKind::Table(entries))
    }

    pub fn pair(key: Value, value: Value) -> Self {
        Self::new(ValueKind::Pair(key, value))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(ValueKind::Reference(name.into()))
    }

    pub fn builder(kind: impl Into<String>) -> Self {
        Self::new(ValueKind::Builder(kind.into()))
    }

    pub fn kind(&self) -> &ValueKind {
        &self.0
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            ValueKind::Bool(_) => "Boolean",
            ValueKind::Integer(_) => "Integer",
            ValueKind::Decimal(_) => "Decimal",
            ValueKind::String(_) => "String",
            ValueKind::List(_) => "List",
            ValueKind::Table(_) => "Table",
            ValueKind::Pair(..) => "Pair",
            ValueKind::Reference(_) => "Reference",
            ValueKind::Builder(_) => "Builder",
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(&*self.0, ValueKind::String(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &*self.0 {
            ValueKind::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Bool(b) => Value::bool(*b),
            Literal::Integer(n) => Value::integer(n.clone()),
            Literal::Decimal(d) => Value::decimal(d.clone()),
            Literal::String(s) => Value::string(s.clone()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Integer(n) => write!(f, "{n}"),
            ValueKind::Decimal(d) => write!(f, "{d}"),
            ValueKind::String(s) => write!(f, "{s:?}"),
            ValueKind::List(values) => f.debug_list().entries(values.iter()).finish(),
            ValueKind::Table(table) => f.debug_map().entries(table.iter()).finish(),
            ValueKind::Pair(key, value) => write!(f, "{key:?}: {value:?}"),
            ValueKind::Reference(name) => write!(f, "<ref {name}>"),
            ValueKind::Builder(kind) => write!(f, "<builder {kind}>"),
        }
    }
}

/// Canonical textual form, also used when a value is concatenated onto a
/// string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Integer(n) => write!(f, "{n}"),
            ValueKind::Decimal(d) => write!(f, "{d}"),
            ValueKind::String(s) => write!(f, "{s}"),
            ValueKind::List(values) => {
                write!(f, "[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            ValueKind::Table(table) => {
                write!(f, "[")?;
                for (idx, (key, value)) in table.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "]")
            }
            ValueKind::Pair(key, value) => write!(f, "{key}: {value}"),
            ValueKind::Reference(name) => write!(f, "{name}"),
            ValueKind::Builder(kind) => write!(f, "{kind} {{ .. }}"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ValueKind {
    Bool(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    String(String),
    List(Vec<Value>),
    Table(Table),
    /// Result of a standalone `key: value` binding.
    Pair(Value, Value),
    /// Names a session declaration without forcing it.
    Reference(String),
    /// Placeholder produced by a builder block; carries the type name.
    Builder(String),
}

// Table equality ignores order, so only the entry count feeds the hash.
impl Hash for ValueKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ValueKind::Bool(b) => b.hash(state),
            ValueKind::Integer(n) => n.hash(state),
            ValueKind::Decimal(d) => d.hash(state),
            ValueKind::String(s) => s.hash(state),
            ValueKind::List(values) => values.hash(state),
            ValueKind::Table(table) => table.len().hash(state),
            ValueKind::Pair(key, value) => {
                key.hash(state);
                value.hash(state);
            }
            ValueKind::Reference(name) | ValueKind::Builder(name) => name.hash(state),
        }
    }
}
