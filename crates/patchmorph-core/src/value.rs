//! Parameter values and mutability status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored parameter value.
///
/// The kind of a key is whatever setter last wrote it; switching kinds is legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Str(String),
}

impl Value {
    #[inline]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            Self::Int(_) => None,
        }
    }

    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    #[inline]
    pub fn is_str(&self) -> bool {
        matches!(self, Self::Str(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// Whether the mutation engine may touch a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Mutable. Default for integer keys.
    Free,
    /// Never mutated. Default for string keys.
    Immutable,
    /// Never mutated, and hidden from [`Model::keys`](crate::Model::keys).
    Restricted,
}

impl Status {
    /// Status a key has when none was declared.
    #[inline]
    pub fn default_for(value: &Value) -> Self {
        match value {
            Value::Int(_) => Self::Free,
            Value::Str(_) => Self::Immutable,
        }
    }

    #[inline]
    pub fn is_free(self) -> bool {
        self == Self::Free
    }
}
