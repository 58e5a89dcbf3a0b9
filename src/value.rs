//! The CIF value model: the six-variant sum type from `spec.md` §3.
//!
//! Grounded in the teacher's `CifValue`/`CifValueKind` split
//! (`crates/cif-parser/src/ast/value.rs`) but reshaped so the numeric
//! variant never collapses to a bare `f64` — `spec.md` §3 and §9 are
//! explicit that storage fidelity lives in the decimal digit string, with
//! the binary approximation kept only for callers who want fast arithmetic.

use std::collections::HashMap;

use crate::number::Number;
use crate::unicode::normalize;

/// A single CIF value (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    /// A sequence of code points with all CIF delimiter/prefix/fold
    /// protocol decoding already applied.
    Char(String),
    /// A number with an exact digit-string representation and optional
    /// standard uncertainty.
    Numb(Number),
    /// An ordered sequence of values (CIF 2.0 only).
    List(Vec<Value>),
    /// A normalized-key -> value mapping preserving the latest original key
    /// spelling (CIF 2.0 only).
    Table(Table),
    /// The inapplicable value, `.`.
    Na,
    /// The unknown value, `?`.
    Unk,
}

/// A CIF 2.0 table value: normalized key -> (original key spelling, value).
///
/// Lookup is by normalized key (`spec.md` §3, "Table keys use the same
/// normalization for lookup equality but preserve the last-inserted form for
/// enumeration"); inserting under a key that normalizes the same as an
/// existing one replaces both the value and the remembered original
/// spelling.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Table {
    entries: HashMap<String, (String, Value)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value under `key`, returning the previous value (if the
    /// normalized key already existed).
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        let norm = normalize(&key);
        self.entries
            .insert(norm, (key, value))
            .map(|(_, old_value)| old_value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&normalize(key)).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(&normalize(key)).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize(key))
    }

    /// Iterate `(original_key_spelling, value)` pairs in unspecified order
    /// (`spec.md` §3 only guarantees the *last-inserted spelling* survives
    /// per key, not a stable enumeration order for tables).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries.iter().all(|(norm_key, (_, value))| {
            other
                .entries
                .get(norm_key)
                .map(|(_, other_value)| value == other_value)
                .unwrap_or(false)
        })
    }
}

impl Value {
    pub fn is_char(&self) -> bool {
        matches!(self, Value::Char(_))
    }
    pub fn is_numb(&self) -> bool {
        matches!(self, Value::Numb(_))
    }
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }
    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }
    pub fn is_na(&self) -> bool {
        matches!(self, Value::Na)
    }
    pub fn is_unk(&self) -> bool {
        matches!(self, Value::Unk)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Char(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Numb(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Whether this value is disallowed as a table key (`spec.md` §4.2,
    /// "Table-key restriction"): list, table, N/A, and unknown are barred.
    pub fn is_disallowed_table_key(&self) -> bool {
        matches!(self, Value::List(_) | Value::Table(_) | Value::Na | Value::Unk)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Char(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Char(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Numb(n)
    }
}
