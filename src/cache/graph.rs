//! Graph-aware codec for cached raw responses
//!
//! A response body is flattened into a list of id-tagged nodes. Every object
//! and array becomes a node whose children are either scalars or `{"$ref": id}`
//! references to earlier nodes. Structurally identical subtrees are interned,
//! so a sub-object repeated across a payload is stored once and every place
//! it appears refers to the same node id.
//!
//! ```text
//! {"root":{"$ref":2},"nodes":[
//!   {"array":["https://swapi.dev/api/films/1/"]},
//!   {"object":[["films",{"$ref":0}],["name","Luke"]]},
//!   {"array":[{"$ref":1},{"$ref":1}]}]}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

/// A child position: an inline scalar or a reference to an earlier node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slot {
    Ref {
        #[serde(rename = "$ref")]
        id: usize,
    },
    Scalar(Value),
}

/// A container node. Key order of objects is kept as encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Object(Vec<(String, Slot)>),
    Array(Vec<Slot>),
}

/// Serialized form of one value graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub root: Slot,
    pub nodes: Vec<Node>,
}

impl GraphDocument {
    /// Flatten a value into interned nodes (children before parents)
    pub fn encode(value: &Value) -> Result<Self> {
        let mut encoder = Encoder::default();
        let root = encoder.slot(value)?;
        Ok(Self {
            root,
            nodes: encoder.nodes,
        })
    }

    /// Rebuild the value. References must point at already-decoded nodes.
    pub fn decode(&self) -> Result<Value> {
        let mut built: Vec<Value> = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let value = match node {
                Node::Object(fields) => {
                    let mut map = serde_json::Map::with_capacity(fields.len());
                    for (key, slot) in fields {
                        map.insert(key.clone(), resolve(slot, &built, index)?);
                    }
                    Value::Object(map)
                }
                Node::Array(items) => Value::Array(
                    items
                        .iter()
                        .map(|slot| resolve(slot, &built, index))
                        .collect::<Result<Vec<_>>>()?,
                ),
            };
            built.push(value);
        }
        resolve(&self.root, &built, built.len())
    }

    /// Number of places a node is referenced more than once
    #[cfg(test)]
    pub fn shared_refs(&self) -> usize {
        let mut uses: HashMap<usize, usize> = HashMap::new();
        let slots = self
            .nodes
            .iter()
            .flat_map(|node| match node {
                Node::Object(fields) => fields.iter().map(|(_, s)| s).collect::<Vec<_>>(),
                Node::Array(items) => items.iter().collect(),
            })
            .chain(std::iter::once(&self.root));
        for slot in slots {
            if let Slot::Ref { id } = slot {
                *uses.entry(*id).or_default() += 1;
            }
        }
        uses.values().filter(|&&n| n > 1).map(|n| n - 1).sum()
    }
}

fn resolve(slot: &Slot, built: &[Value], limit: usize) -> Result<Value> {
    match slot {
        Slot::Scalar(value) => Ok(value.clone()),
        Slot::Ref { id } if *id < limit => built
            .get(*id)
            .cloned()
            .ok_or_else(|| CacheError::Codec(format!("dangling node reference {}", id))),
        Slot::Ref { id } => Err(CacheError::Codec(format!(
            "forward node reference {} (limit {})",
            id, limit
        ))),
    }
}

#[derive(Default)]
struct Encoder {
    nodes: Vec<Node>,
    interned: HashMap<String, usize>,
}

impl Encoder {
    fn slot(&mut self, value: &Value) -> Result<Slot> {
        let node = match value {
            Value::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), self.slot(v)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Array(items) => Node::Array(
                items
                    .iter()
                    .map(|v| self.slot(v))
                    .collect::<Result<Vec<_>>>()?,
            ),
            scalar => return Ok(Slot::Scalar(scalar.clone())),
        };
        self.intern(node)
    }

    fn intern(&mut self, node: Node) -> Result<Slot> {
        // Children are already refs or scalars, so this string is shallow
        let canonical =
            serde_json::to_string(&node).map_err(|e| CacheError::Codec(e.to_string()))?;
        if let Some(&id) = self.interned.get(&canonical) {
            return Ok(Slot::Ref { id });
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        self.interned.insert(canonical, id);
        Ok(Slot::Ref { id })
    }
}

/// Encode a value to bytes for the cache store
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    let doc = GraphDocument::encode(value)?;
    serde_json::to_vec(&doc).map_err(|e| CacheError::Codec(e.to_string()))
}

/// Decode bytes written by [`to_bytes`]
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    let doc: GraphDocument =
        serde_json::from_slice(bytes).map_err(|e| CacheError::Codec(e.to_string()))?;
    doc.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_envelope() {
        let body = json!({
            "count": 3,
            "next": null,
            "results": [
                {"name": "Luke Skywalker", "height": "172", "films": ["https://swapi.dev/api/films/1/"]},
                {"name": "Anakin Skywalker", "height": "188", "films": []},
                {"name": "Shmi Skywalker", "height": "163", "films": [true, 1.5, null]}
            ]
        });

        let bytes = to_bytes(&body).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap(), body);
    }

    #[test]
    fn test_scalar_root() {
        for value in [json!(null), json!(42), json!("text"), json!(false)] {
            let doc = GraphDocument::encode(&value).unwrap();
            assert!(doc.nodes.is_empty());
            assert_eq!(doc.decode().unwrap(), value);
        }
    }

    #[test]
    fn test_repeated_subobjects_share_a_node() {
        let tatooine = json!({"name": "Tatooine", "climate": "arid"});
        let body = json!({
            "luke": {"homeworld": tatooine.clone()},
            "anakin": {"homeworld": tatooine.clone()},
            "planets": [tatooine.clone(), tatooine]
        });

        let doc = GraphDocument::encode(&body).unwrap();

        // tatooine, {"homeworld": ..} (shared by luke and anakin), planets array, root
        assert_eq!(doc.nodes.len(), 4);
        assert!(doc.shared_refs() >= 3);
        assert_eq!(doc.decode().unwrap(), body);
    }

    #[test]
    fn test_ref_shaped_scalar_data_survives() {
        // A payload object that looks like a reference is still a node, not a ref
        let body = json!({"link": {"$ref": 0}});
        assert_eq!(from_bytes(&to_bytes(&body).unwrap()).unwrap(), body);
    }

    #[test]
    fn test_forward_reference_rejected() {
        let doc = GraphDocument {
            root: Slot::Ref { id: 0 },
            nodes: vec![Node::Array(vec![Slot::Ref { id: 0 }])],
        };
        assert!(matches!(doc.decode(), Err(CacheError::Codec(_))));
    }

    #[test]
    fn test_dangling_root_rejected() {
        let doc = GraphDocument {
            root: Slot::Ref { id: 5 },
            nodes: vec![],
        };
        assert!(doc.decode().is_err());
    }

    #[test]
    fn test_garbage_bytes_are_codec_error() {
        assert!(matches!(
            from_bytes(b"not a graph"),
            Err(CacheError::Codec(_))
        ));
    }
}
