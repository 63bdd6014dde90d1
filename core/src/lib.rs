//! Client core for the todo service: remote store plus a synchronized
//! in-memory collection.
//!
//! # Overview
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network. A `Transport` executes the round-trip and
//! `HttpRemoteStore` combines the two into the `RemoteStore` operations.
//! `TodoCache` sits on top: it owns the single ordered collection, applies
//! every mutation only after the server confirms it, and notifies
//! subscribers with immutable snapshots.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - The server is the source of truth for `order`; the cache mirrors its
//!   renumbering rules so every published snapshot is dense.
//! - Drag-reorders are computed locally, sent as a full reorder, and then
//!   replaced by whatever the server returns.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod ordering;
pub mod remote;
pub mod transport;
pub mod types;

pub use cache::{Subscription, TodoCache};
pub use client::TodoClient;
pub use config::{CacheOptions, ClientConfig, ConfigError};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use remote::{HttpRemoteStore, RemoteStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{CreateTodo, ReorderRequest, Snapshot, Todo, TodoId, UpdateTodo};
