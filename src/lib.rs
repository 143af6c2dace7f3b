//! Floodgate - Per-Client Admission Control
//!
//! This crate implements an in-process admission-control gate for HTTP
//! services. Each originating client is tracked with its own token bucket;
//! excess requests are rejected before they reach business logic, and a
//! background reclaimer evicts state for clients that have gone quiet.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
