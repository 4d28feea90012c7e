//! Structured, hierarchical cache keys.
//!
//! A [`QueryKey`] is an ordered tuple of segments, compared structurally:
//! two keys built from equal values are equal regardless of how or where
//! they were built. Parameter maps sort their entries, so insertion order
//! never affects equality. Prefix ordering over keys is what makes coarse
//! invalidation possible (invalidating `[users]` hits `[users, list, ...]`
//! and `[users, detail, ...]` alike).

use std::collections::BTreeMap;
use std::fmt;

/// A primitive parameter value usable inside a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// An order-insensitive bag of named parameters.
///
/// Backed by a `BTreeMap` so that structural equality and hashing do not
/// depend on the order `set` calls were made in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. `None` values are skipped entirely, matching the
    /// convention that an absent filter is not part of the key.
    pub fn set(mut self, name: &str, value: Option<impl Into<ParamValue>>) -> Self {
        if let Some(value) = value {
            self.0.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

/// One element of a key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Text(String),
    Int(i64),
    Params(Params),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(s) => write!(f, "{s}"),
            Segment::Int(n) => write!(f, "{n}"),
            Segment::Params(p) => {
                write!(f, "{{")?;
                for (i, (k, v)) in p.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match v {
                        ParamValue::Text(s) => write!(f, "{k}={s}")?,
                        ParamValue::Int(n) => write!(f, "{k}={n}")?,
                        ParamValue::Bool(b) => write!(f, "{k}={b}")?,
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

/// An ordered, structurally-compared cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<Segment>);

impl QueryKey {
    /// Starts a key at a resource namespace, e.g. `QueryKey::root("users")`.
    pub fn root(namespace: &str) -> Self {
        Self(vec![Segment::Text(namespace.to_string())])
    }

    /// Appends a text segment.
    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(Segment::Text(part.into()));
        self
    }

    /// Appends an integer segment.
    pub fn with_int(mut self, part: i64) -> Self {
        self.0.push(Segment::Int(part));
        self
    }

    /// Appends a parameter-map segment. Empty maps are still appended so
    /// that `list(no filters)` and `list` remain distinct keys.
    pub fn with_params(mut self, params: Params) -> Self {
        self.0.push(Segment::Params(params));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// True when `self` is a (non-strict) prefix of `other`, i.e. `other`
    /// is `self` or a descendant of it.
    pub fn is_prefix_of(&self, other: &QueryKey) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{seg}")?;
        }
        write!(f, "]")
    }
}
