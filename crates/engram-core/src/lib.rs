//! Engram core — bitemporal knowledge-graph primitives.
//!
//! This crate has no I/O. It models:
//!
//! - [`bitemporal`]: the valid-time/transaction-time model (C1).
//! - [`schema`]: a declarative node/edge schema registry (C2).
//! - [`query`]: a fluent, parameterized path-expression builder (C3).
//! - [`validator`]: a static allow/deny checker for user-submitted read-only
//!   path expressions (C4).
//!
//! Everything here is synchronous and `Send + Sync`; the async, networked
//! parts of the system (tenant routing, the memory service, auth, HTTP) live
//! in `engram-server`.

pub mod bitemporal;
pub mod error;
pub mod query;
pub mod schema;
pub mod validator;

pub use bitemporal::{
    close_interval, current_tt, current_vt, live_at, now, open_interval, valid_over, Interval,
    MAX_DATE,
};
pub use error::Error;
pub use query::{Direction, HopRange, NodeQuery, Order, ParamStore, TraversalQuery, Value, QB, TB};
pub use schema::{
    define_schema, Cardinality, EdgeDescriptor, FieldSpec, FieldType, NodeSchema, SchemaRegistry,
};
pub use validator::{validate_read_only, ValidationOutcome};

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        define_schema, now, validate_read_only, Direction, Error, FieldSpec, FieldType, Interval,
        NodeSchema, SchemaRegistry, Value, MAX_DATE, QB, TB,
    };
}
