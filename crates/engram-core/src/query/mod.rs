//! Fluent, parameterized path-expression builder (C3).
//!
//! Two surfaces: [`QB`] builds single-node queries, [`TB`] builds
//! traversals. Both produce an immutable, renderable value
//! ([`NodeQuery`]/[`TraversalQuery`]) rather than executing anything —
//! `engram-core` has no I/O. `engram-server`'s `GraphBackend` trait consumes
//! these values; rendering to the ASCII-arrow lingua franca is what makes
//! them testable for determinism (§8.2) without a live backend.

pub mod ast;
pub mod node;
pub mod param;
pub mod traversal;

pub use ast::{CompareOp, Direction, HopRange, Order, Predicate};
pub use node::{AsOfScope, ExecKind, NodeQuery, QB};
pub use param::{ParamStore, Value};
pub use traversal::{TraversalQuery, TB};
