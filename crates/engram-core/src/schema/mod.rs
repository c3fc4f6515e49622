//! Declarative node/edge schema registry (C2).
//!
//! A schema is a map from node label to field map, plus a map from edge type
//! to a descriptor naming the endpoints, cardinality, and whether the edge is
//! itself bitemporal. Construction and validation happen in one step:
//! [`define_schema`] either returns a usable [`SchemaRegistry`] or fails with
//! [`Error::Schema`] describing every structural defect found.

pub mod catalogue;

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// One field's declared type. `Array` requires a non-`None` element type;
/// `Enum` requires a non-empty literal set — both enforced in
/// [`FieldSpec::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    /// Millisecond epoch timestamp.
    Timestamp,
    Enum(Vec<String>),
    Array(Box<FieldType>),
}

/// A field declaration: type plus the constraints §3.2 allows.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub optional: bool,
    pub default: Option<serde_json::Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub max_length: Option<usize>,
}

impl FieldSpec {
    /// A required field with no constraints.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: false,
            default: None,
            min: None,
            max: None,
            max_length: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default_value(mut self, v: serde_json::Value) -> Self {
        self.default = Some(v);
        self
    }

    pub fn min(mut self, v: f64) -> Self {
        self.min = Some(v);
        self
    }

    pub fn max(mut self, v: f64) -> Self {
        self.max = Some(v);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    fn validate(&self, field_name: &str) -> std::result::Result<(), String> {
        match &self.field_type {
            FieldType::Enum(literals) if literals.is_empty() => {
                Some(format!("field '{field_name}': enum type must have a non-empty literal set"))
            }
            FieldType::Array(elem) if matches!(**elem, FieldType::Array(_)) => {
                // Nested arrays are legal; this branch exists only so the
                // match is exhaustive-looking without a catch-all silencing
                // future FieldType variants.
                None
            }
            _ => None,
        }
        .map_or(Ok(()), Err)
    }
}

/// A node label's field map. Bitemporal fields (`vt_start`, `vt_end`,
/// `tt_start`, `tt_end`) and `id`/`org_id` are implicit on every node and are
/// not listed here — the registry adds them automatically.
#[derive(Debug, Clone)]
pub struct NodeSchema {
    pub label: String,
    pub fields: BTreeMap<String, FieldSpec>,
}

impl NodeSchema {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }
}

/// Edge multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// An edge type's descriptor: endpoints, cardinality, and whether the edge
/// carries its own bitemporal interval (all edges in this system do, per
/// §3.3, but the flag is modeled explicitly rather than assumed).
#[derive(Debug, Clone)]
pub struct EdgeDescriptor {
    pub edge_type: String,
    pub from: String,
    pub to: String,
    pub cardinality: Cardinality,
    pub temporal: bool,
    pub properties: BTreeMap<String, FieldSpec>,
}

impl EdgeDescriptor {
    pub fn new(
        edge_type: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            edge_type: edge_type.into(),
            from: from.into(),
            to: to.into(),
            cardinality,
            temporal: true,
            properties: BTreeMap::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }
}

/// A validated, immutable schema. Constructed once at startup and shared
/// read-only thereafter (§5, "Shared resources").
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    nodes: BTreeMap<String, NodeSchema>,
    edges: BTreeMap<String, EdgeDescriptor>,
}

impl SchemaRegistry {
    /// All declared node labels, in a stable (sorted) order.
    pub fn node_labels(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    /// All declared edge types, in a stable (sorted) order.
    pub fn edge_types(&self) -> Vec<&str> {
        self.edges.keys().map(String::as_str).collect()
    }

    /// Edges whose `from` endpoint is `label`.
    pub fn edges_from(&self, label: &str) -> Vec<&EdgeDescriptor> {
        self.edges.values().filter(|e| e.from == label).collect()
    }

    /// Edges whose `to` endpoint is `label`.
    pub fn edges_to(&self, label: &str) -> Vec<&EdgeDescriptor> {
        self.edges.values().filter(|e| e.to == label).collect()
    }

    pub fn node(&self, label: &str) -> Option<&NodeSchema> {
        self.nodes.get(label)
    }

    pub fn edge(&self, edge_type: &str) -> Option<&EdgeDescriptor> {
        self.edges.get(edge_type)
    }

    /// True iff this registry's invariants all hold. A registry returned by
    /// [`define_schema`] is always valid — this exists for callers that hold
    /// onto a registry across a boundary and want to reassert the contract.
    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Every structural defect found, per the validation rules in §4.2.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for edge in self.edges.values() {
            if !self.nodes.contains_key(&edge.from) {
                errors.push(format!(
                    "edge '{}': from-label '{}' is not defined",
                    edge.edge_type, edge.from
                ));
            }
            if !self.nodes.contains_key(&edge.to) {
                errors.push(format!(
                    "edge '{}': to-label '{}' is not defined",
                    edge.edge_type, edge.to
                ));
            }
            for (name, spec) in &edge.properties {
                if let Err(e) = spec.validate(name) {
                    errors.push(format!("edge '{}': {e}", edge.edge_type));
                }
            }
        }
        for node in self.nodes.values() {
            for (name, spec) in &node.fields {
                if let Err(e) = spec.validate(name) {
                    errors.push(format!("node '{}': {e}", node.label));
                }
            }
        }
        errors
    }
}

/// Constructs and validates a [`SchemaRegistry`] in one step. Fails with
/// [`Error::Schema`] joining every defect found, rather than stopping at the
/// first.
pub fn define_schema(
    nodes: Vec<NodeSchema>,
    edges: Vec<EdgeDescriptor>,
) -> Result<SchemaRegistry> {
    let registry = SchemaRegistry {
        nodes: nodes.into_iter().map(|n| (n.label.clone(), n)).collect(),
        edges: edges
            .into_iter()
            .map(|e| (e.edge_type.clone(), e))
            .collect(),
    };
    let errors = registry.validation_errors();
    if errors.is_empty() {
        Ok(registry)
    } else {
        Err(Error::Schema(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_schema_round_trips() {
        let nodes = vec![NodeSchema::new("Session"), NodeSchema::new("Turn")];
        let edges = vec![EdgeDescriptor::new(
            "HAS_TURN",
            "Session",
            "Turn",
            Cardinality::OneToMany,
        )];
        let registry = define_schema(nodes, edges).unwrap();
        assert!(registry.is_valid());
        assert_eq!(registry.node_labels(), vec!["Session", "Turn"]);
        assert_eq!(registry.edges_from("Session").len(), 1);
        assert_eq!(registry.edges_to("Turn").len(), 1);
    }

    #[test]
    fn undefined_endpoint_is_rejected() {
        let nodes = vec![NodeSchema::new("Session")];
        let edges = vec![EdgeDescriptor::new(
            "HAS_TURN",
            "Session",
            "Turn",
            Cardinality::OneToMany,
        )];
        let err = define_schema(nodes, edges).unwrap_err();
        match err {
            Error::Schema(msg) => assert!(msg.contains("Turn")),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn empty_enum_is_rejected() {
        let nodes = vec![NodeSchema::new("Memory").field(
            "type",
            FieldSpec::new(FieldType::Enum(vec![])),
        )];
        let err = define_schema(nodes, vec![]).unwrap_err();
        match err {
            Error::Schema(msg) => assert!(msg.contains("enum")),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn multiple_defects_are_all_reported() {
        let nodes = vec![NodeSchema::new("Session")];
        let edges = vec![
            EdgeDescriptor::new("A", "Session", "Missing1", Cardinality::OneToMany),
            EdgeDescriptor::new("B", "Missing2", "Session", Cardinality::OneToMany),
        ];
        let err = define_schema(nodes, edges).unwrap_err();
        match err {
            Error::Schema(msg) => {
                assert!(msg.contains("Missing1"));
                assert!(msg.contains("Missing2"));
            }
            other => panic!("expected Schema error, got {other:?}"),
        }
    }
}
