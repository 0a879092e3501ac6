//! bxt-stage - staging client for bxt package repositories
//!
//! Packages are staged locally as per-section commits (add, delete, copy,
//! move) and pushed to a bxt server in one multipart request.
//!
//! # Architecture
//!
//! - [`types`]: section addresses, uploads and server messages
//! - [`commit`]: commit construction and merging
//! - [`store`]: the staging area, one commit per section
//! - [`stage`]: grouping local files into add entries
//! - [`sections`]: queries over the server's section listing
//! - [`submit`]: payload encoding and the push coordinator
//! - [`backend`]: the server API and its HTTP client
//! - [`auth`]: login sessions
//! - [`config`]: configuration loading
//! - [`state`]: on-disk persistence

pub mod auth;
pub mod backend;
pub mod commit;
pub mod config;
pub mod error;
pub mod sections;
pub mod stage;
pub mod state;
pub mod store;
pub mod submit;
pub mod types;
