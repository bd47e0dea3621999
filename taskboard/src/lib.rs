//! Taskboard: task board client library.
//!
//! A single [`cache::TaskCache`] per session is the source of truth; the
//! [`views`] functions derive everything shown from it, and every write goes
//! through the [`coordinator::Coordinator`].

pub mod cache;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod form;
pub mod optimistic;
pub mod render;
pub mod session;
pub mod store;
pub mod validate;
pub mod views;
