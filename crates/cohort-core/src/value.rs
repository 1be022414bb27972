//! Dynamically-typed command arguments, results and construction parameters.
//!
//! Commands are addressed by name, so their arguments and results cross the
//! group boundary as [`Value`]s. Construction parameters are an ordered map
//! of named values ([`Params`]).

use indexmap::IndexMap;

/// Named parameters, in insertion order.
///
/// Used for agent construction parameters, for the fixed extra arguments a
/// group passes to every agent it creates, and for attribute maps returned
/// by the logging commands.
pub type Params = IndexMap<String, Value>;

/// A dynamically-typed argument or result.
///
/// # Examples
///
/// ```
/// use cohort_core::Value;
///
/// let v: Value = 3.5.into();
/// assert_eq!(v.as_f64(), Some(3.5));
/// assert_eq!(Value::from(2i64).as_f64(), Some(2.0));
/// assert!(Value::Unit.is_unit());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value. Returned by commands executed only for their side effects.
    #[default]
    Unit,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    Text(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// Named values.
    Map(Params),
}

impl Value {
    /// Whether this is [`Value::Unit`].
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    /// Numeric view: integers and floats widen to `f64`, booleans map to
    /// 0 or 1, everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view. Floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List view.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Map view.
    pub fn as_map(&self) -> Option<&Params> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Short type name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Params> for Value {
    fn from(v: Params) -> Self {
        Self::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_view_widens() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn float_is_not_an_int() {
        assert_eq!(Value::Float(2.0).as_i64(), None);
    }

    #[test]
    fn vec_converts_elementwise() {
        let v = Value::from(vec!["a", "b"]);
        assert_eq!(
            v.as_list().map(|l| l.len()),
            Some(2),
            "expected a two-element list, got {}",
            v.kind()
        );
    }
}
