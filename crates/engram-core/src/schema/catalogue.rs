//! The concrete node/edge catalogue for agent-memory artifacts (§3.3).
//!
//! This is the one schema every tenant namespace shares — a fixed set of
//! labels and edge types describing sessions, conversation turns, reasoning,
//! tool calls, file touches, long-term memories, and named entities. Built
//! once via [`build`] and handed to the registry at startup.

use super::{Cardinality, EdgeDescriptor, FieldSpec, FieldType, NodeSchema};
use crate::error::Result;

/// Builds the fixed §3.3 catalogue.
pub fn build() -> Result<super::SchemaRegistry> {
    let nodes = vec![
        NodeSchema::new("Session")
            .field("user_id", FieldSpec::new(FieldType::String))
            .field("started_at", FieldSpec::new(FieldType::Timestamp))
            .field("agent_type", FieldSpec::new(FieldType::String))
            .field("working_dir", FieldSpec::new(FieldType::String).optional())
            .field("git_remote", FieldSpec::new(FieldType::String).optional())
            .field("summary", FieldSpec::new(FieldType::String).optional())
            .field(
                "embedding",
                FieldSpec::new(FieldType::Array(Box::new(FieldType::Float))).optional(),
            ),
        NodeSchema::new("Turn")
            .field("sequence_index", FieldSpec::new(FieldType::Int))
            .field("prompt_preview", FieldSpec::new(FieldType::String))
            .field("response_preview", FieldSpec::new(FieldType::String))
            .field("token_count", FieldSpec::new(FieldType::Int).min(0.0))
            .field("cost", FieldSpec::new(FieldType::Float).min(0.0))
            .field("duration_ms", FieldSpec::new(FieldType::Int).min(0.0))
            .field(
                "files_touched",
                FieldSpec::new(FieldType::Array(Box::new(FieldType::String)))
                    .default_value(serde_json::json!([])),
            ),
        NodeSchema::new("Reasoning")
            .field("content_hash", FieldSpec::new(FieldType::String))
            .field("preview", FieldSpec::new(FieldType::String))
            .field("sequence_index", FieldSpec::new(FieldType::Int))
            .field(
                "reasoning_type",
                FieldSpec::new(FieldType::Enum(vec![
                    "planning".into(),
                    "analysis".into(),
                    "reflection".into(),
                ])),
            ),
        NodeSchema::new("ToolCall")
            .field("call_id", FieldSpec::new(FieldType::String))
            .field("tool_name", FieldSpec::new(FieldType::String))
            .field("tool_type", FieldSpec::new(FieldType::String))
            .field("arguments", FieldSpec::new(FieldType::String))
            .field(
                "status",
                FieldSpec::new(FieldType::Enum(vec![
                    "pending".into(),
                    "running".into(),
                    "completed".into(),
                    "failed".into(),
                ])),
            )
            .field("sequence_index", FieldSpec::new(FieldType::Int)),
        NodeSchema::new("Observation")
            .field("tool_call_id", FieldSpec::new(FieldType::String))
            .field("content", FieldSpec::new(FieldType::String))
            .field("is_error", FieldSpec::new(FieldType::Bool)),
        NodeSchema::new("FileTouch")
            .field("path", FieldSpec::new(FieldType::String))
            .field(
                "action",
                FieldSpec::new(FieldType::Enum(vec![
                    "create".into(),
                    "edit".into(),
                    "delete".into(),
                    "read".into(),
                ])),
            )
            .field("tool_call_id", FieldSpec::new(FieldType::String))
            .field("lines_added", FieldSpec::new(FieldType::Int).min(0.0))
            .field("lines_removed", FieldSpec::new(FieldType::Int).min(0.0)),
        NodeSchema::new("Memory")
            .field("content", FieldSpec::new(FieldType::String).max_length(50_000))
            .field("content_hash", FieldSpec::new(FieldType::String))
            .field(
                "memory_type",
                FieldSpec::new(FieldType::Enum(vec![
                    "decision".into(),
                    "context".into(),
                    "insight".into(),
                    "preference".into(),
                    "fact".into(),
                ]))
                .default_value(serde_json::json!("context")),
            )
            .field(
                "tags",
                FieldSpec::new(FieldType::Array(Box::new(FieldType::String)))
                    .default_value(serde_json::json!([])),
            )
            .field("project", FieldSpec::new(FieldType::String).optional())
            .field("last_accessed", FieldSpec::new(FieldType::Timestamp).optional())
            .field(
                "access_count",
                FieldSpec::new(FieldType::Int).min(0.0).default_value(serde_json::json!(0)),
            )
            .field(
                "decay_score",
                FieldSpec::new(FieldType::Float)
                    .min(0.0)
                    .max(1.0)
                    .default_value(serde_json::json!(1.0)),
            )
            .field(
                "pinned",
                FieldSpec::new(FieldType::Bool).default_value(serde_json::json!(false)),
            )
            .field(
                "embedding",
                FieldSpec::new(FieldType::Array(Box::new(FieldType::Float))).optional(),
            ),
        NodeSchema::new("Entity")
            .field("name", FieldSpec::new(FieldType::String))
            .field(
                "aliases",
                FieldSpec::new(FieldType::Array(Box::new(FieldType::String)))
                    .default_value(serde_json::json!([])),
            )
            .field("entity_type", FieldSpec::new(FieldType::String))
            .field(
                "mention_count",
                FieldSpec::new(FieldType::Int).min(0.0).default_value(serde_json::json!(0)),
            ),
    ];

    let edges = vec![
        EdgeDescriptor::new("HAS_TURN", "Session", "Turn", Cardinality::OneToMany),
        EdgeDescriptor::new("NEXT", "Turn", "Turn", Cardinality::OneToOne),
        EdgeDescriptor::new("CONTAINS", "Turn", "Reasoning", Cardinality::OneToMany),
        EdgeDescriptor::new("INVOKES", "Turn", "ToolCall", Cardinality::OneToMany),
        EdgeDescriptor::new("TRIGGERS", "Reasoning", "ToolCall", Cardinality::OneToMany),
        EdgeDescriptor::new("TOUCHES", "ToolCall", "FileTouch", Cardinality::OneToMany),
        EdgeDescriptor::new("YIELDS", "ToolCall", "Observation", Cardinality::OneToOne),
        EdgeDescriptor::new("REPLACES", "Memory", "Memory", Cardinality::OneToOne),
        EdgeDescriptor::new("MENTIONS", "Memory", "Entity", Cardinality::ManyToMany)
            .property("context", FieldSpec::new(FieldType::String).optional())
            .property("confidence", FieldSpec::new(FieldType::Float).min(0.0).max(1.0))
            .property("mention_count", FieldSpec::new(FieldType::Int).min(0.0)),
        EdgeDescriptor::new("RELATED_TO", "Memory", "Memory", Cardinality::ManyToMany),
    ];

    super::define_schema(nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_internally_consistent() {
        let registry = build().unwrap();
        assert!(registry.is_valid());
    }

    #[test]
    fn memory_replaces_memory() {
        let registry = build().unwrap();
        let edge = registry.edge("REPLACES").unwrap();
        assert_eq!(edge.from, "Memory");
        assert_eq!(edge.to, "Memory");
    }

    #[test]
    fn session_has_turn_edges_are_discoverable() {
        let registry = build().unwrap();
        let from_session = registry.edges_from("Session");
        assert_eq!(from_session.len(), 1);
        assert_eq!(from_session[0].edge_type, "HAS_TURN");
    }
}
