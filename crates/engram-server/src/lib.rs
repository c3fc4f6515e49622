//! Engram server library: tenant routing (C5), the memory service (C6),
//! auth/scope gate (C7), rate limiter (C8), and the `/v1/memory/*` HTTP
//! surface (C9), plus the reference adapters for the external
//! collaborators named in §6.3.
//!
//! `main.rs` is a thin composition root over this library so integration
//! tests can drive the HTTP surface directly with `tower`'s `oneshot`
//! rather than a real socket.

pub mod auth;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod ratelimit;
pub mod tenant;
pub mod worker;
