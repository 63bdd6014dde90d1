//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The round-trip itself belongs to a `Transport`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, ReorderRequest, Todo, TodoId, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_health(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/todos/health", self.base_url))
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/todos", self.base_url))
    }

    pub fn build_get_todo(&self, id: TodoId) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/todos/{id}", self.base_url))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Post,
            format!("{}/todos", self.base_url),
            to_json(input)?,
        ))
    }

    pub fn build_update_todo(&self, id: TodoId, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Put,
            format!("{}/todos/{id}", self.base_url),
            to_json(input)?,
        ))
    }

    pub fn build_delete_todo(&self, id: TodoId) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, format!("{}/todos/{id}", self.base_url))
    }

    pub fn build_reorder_todos(&self, items: &[ReorderRequest]) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest::json(
            HttpMethod::Put,
            format!("{}/todos/reorder", self.base_url),
            to_json(items)?,
        ))
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200])
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        check_status(&response, &[200])?;
        from_json(&response.body)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, &[200])?;
        from_json(&response.body)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, &[200, 201])?;
        from_json(&response.body)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, &[200])?;
        from_json(&response.body)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, &[200, 204])
    }

    /// Returns `None` when the server acknowledged the reorder without
    /// echoing the collection; the caller must list to learn the new order.
    pub fn parse_reorder_todos(&self, response: HttpResponse) -> Result<Option<Vec<Todo>>, ApiError> {
        check_status(&response, &[200, 204])?;
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(None);
        }
        from_json(&response.body).map(Some)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, accepted: &[u16]) -> Result<(), ApiError> {
    if accepted.contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Unknown(format!("serialization failed: {e}")))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Unknown(format!("deserialization failed: {e}")))
}
