//! Parameter binding (§4.3: "each user-supplied value is bound to a unique
//! numbered parameter; values never appear inline in the generated
//! expression").

use std::fmt;

/// A bindable literal. Deliberately narrower than [`serde_json::Value`] —
/// only the shapes a path-expression predicate can compare against.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Millisecond epoch timestamp, rendered the same as `Int` but kept as
    /// its own variant so callers don't have to remember the encoding.
    Timestamp(i64),
    StringArray(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::StringArray(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item:?}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Accumulates bound values in call order and hands back `$p<i>`
/// placeholders. Shared by [`super::node::QB`] and [`super::traversal::TB`]
/// so a single builder chain produces one coherent parameter list.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    values: Vec<Value>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value`, returning its placeholder name (`$p0`, `$p1`, …).
    pub fn bind(&mut self, value: Value) -> String {
        let name = format!("$p{}", self.values.len());
        self.values.push(value);
        name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_numbers_sequentially() {
        let mut params = ParamStore::new();
        assert_eq!(params.bind(Value::Int(1)), "$p0");
        assert_eq!(params.bind(Value::Int(2)), "$p1");
        assert_eq!(params.len(), 2);
    }
}
