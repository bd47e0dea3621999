//! Wire contract for the Taskboard task API.
//!
//! Payload types, endpoint paths and the JSON codec shared by the client
//! and the stub server.

pub mod auth;
pub mod codec;
pub mod listing;
pub mod moment;
pub mod paths;
pub mod task;
