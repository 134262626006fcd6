//! Document node tree
//!
//! Scenario documents are decoded with `serde_yaml` and converted into a
//! tree of [`Node`]s. Each node remembers where it sits in the document
//! (as a `$.tests[1].timeout` style path) so that resolution errors can
//! point at the offending element.
//!
//! Scalar values are expanded against the process environment while the
//! tree is built. Values of a `name` key are kept literal.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::common::{Error, Result};
use crate::spec::BASE_FIELDS;

/// Keys whose scalar values are never environment-expanded
const LITERAL_KEYS: &[&str] = &["name"];

/// Location of a node inside its document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    path: String,
}

impl Position {
    /// The document root
    pub fn root() -> Self {
        Self {
            path: "$".to_string(),
        }
    }

    /// Position of the value stored under `key` in the mapping at `self`
    pub fn key(&self, key: &str) -> Self {
        Self {
            path: format!("{}.{}", self.path, key),
        }
    }

    /// Position of the element at `index` in the sequence at `self`
    pub fn index(&self, index: usize) -> Self {
        Self {
            path: format!("{}[{}]", self.path, index),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// The shape and content of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Null,
    /// A scalar, as written (after expansion) plus its typed YAML value
    Scalar { text: String, value: Value },
    Sequence(Vec<Node>),
    /// Mapping entries in document order
    Mapping(Vec<(String, Node)>),
}

/// A positioned document node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pos: Position,
    value: NodeValue,
}

impl Node {
    /// Parse a YAML document into a node tree
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    /// Build a node tree rooted at `$` from a decoded YAML value
    pub fn from_value(value: &Value) -> Result<Self> {
        build(value, Position::root(), true)
    }

    pub fn pos(&self) -> &Position {
        &self.pos
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, NodeValue::Null)
    }

    /// Entries of a mapping node
    pub fn expect_mapping(&self) -> Result<&[(String, Node)]> {
        match &self.value {
            NodeValue::Mapping(entries) => Ok(entries),
            _ => Err(Error::ExpectedMap(self.pos.clone())),
        }
    }

    /// Elements of a sequence node
    pub fn expect_sequence(&self) -> Result<&[Node]> {
        match &self.value {
            NodeValue::Sequence(items) => Ok(items),
            _ => Err(Error::ExpectedSequence(self.pos.clone())),
        }
    }

    /// Text of a scalar node; an explicit null reads as the empty string
    pub fn expect_scalar(&self) -> Result<&str> {
        match &self.value {
            NodeValue::Scalar { text, .. } => Ok(text),
            NodeValue::Null => Ok(""),
            _ => Err(Error::ExpectedScalar(self.pos.clone())),
        }
    }

    pub fn expect_int(&self) -> Result<i64> {
        match &self.value {
            NodeValue::Scalar { text, .. } => text
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::ExpectedInt(self.pos.clone())),
            _ => Err(Error::ExpectedInt(self.pos.clone())),
        }
    }

    pub fn expect_bool(&self) -> Result<bool> {
        match &self.value {
            NodeValue::Scalar {
                value: Value::Bool(b),
                ..
            } => Ok(*b),
            NodeValue::Scalar { text, .. } => match text.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::ExpectedBool(self.pos.clone())),
            },
            _ => Err(Error::ExpectedBool(self.pos.clone())),
        }
    }

    /// A scalar, or a sequence of scalars, as a list of strings
    pub fn expect_string_list(&self) -> Result<Vec<String>> {
        match &self.value {
            NodeValue::Sequence(items) => items
                .iter()
                .map(|item| item.expect_scalar().map(str::to_string))
                .collect(),
            NodeValue::Scalar { text, .. } => Ok(vec![text.clone()]),
            _ => Err(Error::ExpectedSequence(self.pos.clone())),
        }
    }

    /// Value stored under `key`, if this is a mapping that has it
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.value {
            NodeValue::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Reject any key that is neither in `own` nor one of the common base
    /// fields.
    ///
    /// Test unit decoders call this first: an `UnknownField` error is how a
    /// shape tells the resolver that the node belongs to someone else.
    pub fn check_fields(&self, own: &[&str]) -> Result<()> {
        for (key, value) in self.expect_mapping()? {
            if own.contains(&key.as_str()) || BASE_FIELDS.contains(&key.as_str()) {
                continue;
            }
            return Err(Error::unknown_field(key, value.pos()));
        }
        Ok(())
    }

    /// Convert back into a plain YAML value
    pub fn to_value(&self) -> Value {
        match &self.value {
            NodeValue::Null => Value::Null,
            NodeValue::Scalar { value, .. } => value.clone(),
            NodeValue::Sequence(items) => Value::Sequence(items.iter().map(Node::to_value).collect()),
            NodeValue::Mapping(entries) => {
                let mut map = Mapping::new();
                for (key, value) in entries {
                    map.insert(Value::String(key.clone()), value.to_value());
                }
                Value::Mapping(map)
            }
        }
    }

    /// Deserialize this node into any serde type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_yaml::from_value(self.to_value()).map_err(|e| Error::Decode {
            pos: self.pos.clone(),
            message: e.to_string(),
        })
    }
}

fn build(value: &Value, pos: Position, expand: bool) -> Result<Node> {
    let value = match value {
        Value::Null => NodeValue::Null,
        Value::Bool(b) => NodeValue::Scalar {
            text: b.to_string(),
            value: Value::Bool(*b),
        },
        Value::Number(n) => NodeValue::Scalar {
            text: n.to_string(),
            value: Value::Number(n.clone()),
        },
        Value::String(s) => scalar_from_string(s, expand),
        Value::Sequence(items) => NodeValue::Sequence(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| build(item, pos.index(i), expand))
                .collect::<Result<_>>()?,
        ),
        Value::Mapping(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, child) in map {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(Error::ExpectedScalar(pos.clone())),
                };
                let child_expand = expand && !LITERAL_KEYS.contains(&key.as_str());
                let child = build(child, pos.key(&key), child_expand)?;
                entries.push((key, child));
            }
            NodeValue::Mapping(entries)
        }
        Value::Tagged(tagged) => return build(&tagged.value, pos, expand),
    };
    Ok(Node { pos, value })
}

/// Expanded strings are re-typed so `port: ${PORT}` decodes as a number
fn scalar_from_string(raw: &str, expand: bool) -> NodeValue {
    if !expand {
        return NodeValue::Scalar {
            text: raw.to_string(),
            value: Value::String(raw.to_string()),
        };
    }
    let text = expand_env(raw);
    if text == raw {
        return NodeValue::Scalar {
            value: Value::String(text.clone()),
            text,
        };
    }
    let value = match serde_yaml::from_str::<Value>(&text) {
        Ok(v @ (Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(text.clone()),
    };
    NodeValue::Scalar { text, value }
}

/// Expand `$VAR` and `${VAR}` references from the process environment.
///
/// References to unset variables are left as written.
pub fn expand_env(input: &str) -> String {
    static VAR: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("env variable pattern is valid")
    });
    VAR.replace_all(input, |caps: &Captures| {
        let key = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        std::env::var(key).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_follow_document_path() {
        let node = Node::from_yaml_str("tests:\n  - foo: bar\n    timeout:\n      after: 1s\n").unwrap();
        let test = &node.get("tests").unwrap().expect_sequence().unwrap()[0];
        assert_eq!(test.pos().as_str(), "$.tests[0]");
        let after = test.get("timeout").unwrap().get("after").unwrap();
        assert_eq!(after.pos().to_string(), "$.tests[0].timeout.after");
    }

    #[test]
    fn test_env_expansion_skips_name() {
        std::env::set_var("YAMLTEST_NODE_FOO", "expanded");
        let node = Node::from_yaml_str(
            "name: $YAMLTEST_NODE_FOO\nfoo: ${YAMLTEST_NODE_FOO}\nbar: $YAMLTEST_NODE_UNSET\n",
        )
        .unwrap();
        assert_eq!(node.get("name").unwrap().expect_scalar().unwrap(), "$YAMLTEST_NODE_FOO");
        assert_eq!(node.get("foo").unwrap().expect_scalar().unwrap(), "expanded");
        assert_eq!(node.get("bar").unwrap().expect_scalar().unwrap(), "$YAMLTEST_NODE_UNSET");
    }

    #[test]
    fn test_expanded_values_are_retyped() {
        std::env::set_var("YAMLTEST_NODE_PORT", "8080");
        let node = Node::from_yaml_str("port: ${YAMLTEST_NODE_PORT}\n").unwrap();
        let port = node.get("port").unwrap();
        assert_eq!(port.expect_int().unwrap(), 8080);
        assert_eq!(port.to_value(), Value::Number(8080.into()));
    }

    #[test]
    fn test_check_fields_allows_base_fields() {
        let node = Node::from_yaml_str("name: x\ntimeout: 1s\nfoo: bar\n").unwrap();
        assert!(node.check_fields(&["foo"]).is_ok());

        let err = node.check_fields(&["baz"]).unwrap_err();
        match err {
            Error::UnknownField { field, pos } => {
                assert_eq!(field, "foo");
                assert_eq!(pos.as_str(), "$.foo");
            }
            other => panic!("Expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_errors() {
        let node = Node::from_yaml_str("- a\n- b\n").unwrap();
        assert!(matches!(node.expect_mapping(), Err(Error::ExpectedMap(_))));
        assert_eq!(node.expect_string_list().unwrap(), vec!["a", "b"]);

        let scalar = Node::from_yaml_str("forty-two").unwrap();
        assert!(matches!(scalar.expect_int(), Err(Error::ExpectedInt(_))));
        assert!(matches!(scalar.expect_bool(), Err(Error::ExpectedBool(_))));
    }

    #[test]
    fn test_decode_into_serde_type() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Inner {
            bar: String,
            count: u32,
        }
        let node = Node::from_yaml_str("bar: barconfig\ncount: 3\n").unwrap();
        let inner: Inner = node.decode().unwrap();
        assert_eq!(
            inner,
            Inner {
                bar: "barconfig".into(),
                count: 3
            }
        );

        let bad = Node::from_yaml_str("bar: [1]\n").unwrap();
        assert!(matches!(bad.decode::<Inner>(), Err(Error::Decode { .. })));
    }
}
