//! Runtime values produced and consumed by template evaluation.
//!
//! A rendered document is just a [`Value`]: nodes nest inside lists and other
//! nodes, and whatever is left over (strings, numbers, raw markup) becomes text
//! when serialized.

use super::error::TemplateError;
use std::{
    cell::{OnceCell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
};

/// String-keyed map with deterministic iteration order.
pub type Map = BTreeMap<String, Value>;

/// A tagged markup node: `[:tag {attrs} children...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub attrs: Map,
    pub children: Vec<Value>,
}

impl Node {
    pub fn new(tag: impl Into<String>, children: Vec<Value>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Map::new(),
            children,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Keyword(String),
    /// Pre-rendered markup, emitted verbatim by the serializer.
    Raw(String),
    List(Vec<Value>),
    Map(Map),
    Node(Node),
    Deferred(Deferred),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Keyword(_) => "keyword",
            Self::Raw(_) => "raw",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Node(_) => "node",
            Self::Deferred(_) => "deferred",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Keyword(s) | Self::Raw(s) => Some(s),
            _ => None,
        }
    }

    /// Force a top-level deferred value; everything else is returned as is.
    pub fn resolve(self) -> Result<Self, TemplateError> {
        match self {
            Self::Deferred(deferred) => deferred.force(),
            other => Ok(other),
        }
    }

    /// Look up a field by key. Maps are keyed by name, nodes by attribute,
    /// lists by index. Missing entries are `Nil`.
    pub fn field(&self, key: &Self) -> Result<Self, TemplateError> {
        let found = match (self, key) {
            (Self::Map(map), Self::Str(k) | Self::Keyword(k)) => map.get(k).cloned(),
            (Self::Node(node), Self::Str(k) | Self::Keyword(k)) => node.attrs.get(k).cloned(),
            (Self::List(items), Self::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned(),
            (Self::Deferred(deferred), _) => return deferred.force()?.field(key),
            _ => None,
        };
        found.unwrap_or_default().resolve()
    }

    /// Plain-text rendering used by `str` and friends.
    ///
    /// Lists concatenate their items; keywords drop the leading colon.
    pub fn to_text(&self) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) | Self::Keyword(s) | Self::Raw(s) => s.clone(),
            Self::List(items) => items.iter().map(Self::to_text).collect(),
            Self::Map(map) => {
                let entries: Vec<_> = map
                    .iter()
                    .map(|(k, v)| format!(":{k} {}", v.to_text()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
            Self::Node(node) => node.children.iter().map(Self::to_text).collect(),
            Self::Deferred(deferred) => deferred
                .force()
                .map(|v| v.to_text())
                .unwrap_or_default(),
        }
    }

    /// Rewrite every node bottom-up: children first, then the node itself.
    ///
    /// Deferred values are left untouched.
    pub fn map_nodes(self, f: &dyn Fn(Node) -> Self) -> Self {
        match self {
            Self::List(items) => Self::List(items.into_iter().map(|v| v.map_nodes(f)).collect()),
            Self::Node(mut node) => {
                node.children = node.children.into_iter().map(|v| v.map_nodes(f)).collect();
                f(node)
            }
            other => other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

// ============================================================================
// Deferred values
// ============================================================================

type Thunk = Box<dyn FnOnce() -> Result<Value, TemplateError>>;

/// Compute-once cell: the thunk runs on first [`force`](Self::force) and its
/// outcome, success or failure, is returned by every later call.
///
/// Clones share the same cell.
#[derive(Clone)]
pub struct Deferred(Rc<DeferredInner>);

struct DeferredInner {
    outcome: OnceCell<Result<Value, TemplateError>>,
    thunk: RefCell<Option<Thunk>>,
}

impl Deferred {
    pub fn new(thunk: impl FnOnce() -> Result<Value, TemplateError> + 'static) -> Self {
        Self(Rc::new(DeferredInner {
            outcome: OnceCell::new(),
            thunk: RefCell::new(Some(Box::new(thunk))),
        }))
    }

    /// An already computed value.
    pub fn ready(value: Value) -> Self {
        Self(Rc::new(DeferredInner {
            outcome: OnceCell::from(Ok(value)),
            thunk: RefCell::new(None),
        }))
    }

    #[cfg(test)]
    pub fn is_forced(&self) -> bool {
        self.0.outcome.get().is_some()
    }

    pub fn force(&self) -> Result<Value, TemplateError> {
        if let Some(outcome) = self.0.outcome.get() {
            return outcome.clone();
        }

        // Taken before running so a thunk that reads itself fails instead of looping.
        let thunk = self.0.thunk.borrow_mut().take();
        let Some(thunk) = thunk else {
            return Err(TemplateError::Eval {
                template: "<deferred>".into(),
                message: "deferred value read while it was being computed".into(),
            });
        };

        let outcome = thunk();
        self.0.outcome.get_or_init(|| outcome).clone()
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.outcome.get() {
            Some(Ok(value)) => f.debug_tuple("Deferred").field(value).finish(),
            Some(Err(err)) => f.debug_tuple("Deferred").field(err).finish(),
            None => f.write_str("Deferred(<pending>)"),
        }
    }
}
