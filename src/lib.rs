//! Scoring API Library
//!
//! This library provides the core functionality for the scoring API: a
//! single RPC-style method that authenticates a caller, validates a
//! structured argument payload against a per-method schema, and produces
//! either a numeric score or a mapping of client identifiers to topic
//! interests, consulting an external key-value store to avoid recomputation.
//!
//! # Modules
//!
//! - `auth`: Authentication digest computation and comparison.
//! - `config`: Configuration management.
//! - `dispatch`: Method dispatch pipeline (envelope, auth and resolution gates).
//! - `errors`: Error handling types.
//! - `fields`: Typed, self-validating field specifications.
//! - `handlers`: HTTP request handlers.
//! - `requests`: Concrete request schemas and cross-field rules.
//! - `schema`: Per-request schema validation engine.
//! - `scoring`: Scoring engine and interests lookup.
//! - `store`: Resilient key-value store client.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod fields;
pub mod handlers;
pub mod requests;
pub mod schema;
pub mod scoring;
pub mod store;
