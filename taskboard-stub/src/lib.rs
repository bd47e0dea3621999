//! Taskboard stub server library.
//!
//! An in-memory implementation of the task API for integration tests and
//! local demos. It speaks the same routes and payloads as the real service
//! and can be told to misbehave: wrap listings differently, fail upcoming
//! requests, or revoke every issued token.

pub mod config;
pub mod server;
pub mod store;
