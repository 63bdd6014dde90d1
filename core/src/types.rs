//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.
//!
//! The display position is called `order` in Rust and `reOrder` on the wire.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-assigned identity of a todo. Never reused once deleted.
pub type TodoId = u64;

/// Read-only view of the whole collection as last published by the cache.
pub type Snapshot = Arc<Vec<Todo>>;

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub name: String,
    pub price: u64,
    pub limit_date: NaiveDate,
    /// 1-based display position, dense and unique within the collection.
    #[serde(rename = "reOrder")]
    pub order: u32,
}

/// Request payload for creating a new todo. The server assigns `id` and
/// appends the entry at the end of the current order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub name: String,
    pub price: u64,
    pub limit_date: NaiveDate,
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_date: Option<NaiveDate>,
    #[serde(rename = "reOrder", skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl UpdateTodo {
    /// True when the update asks the server to move the todo.
    pub fn changes_order(&self) -> bool {
        self.order.is_some()
    }
}

/// One entry of a bulk reorder: `id` moves to the 1-based `order_index`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub id: TodoId,
    pub order_index: u32,
}
