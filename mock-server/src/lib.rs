use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub name: String,
    pub price: u64,
    pub limit_date: NaiveDate,
    #[serde(rename = "reOrder")]
    pub order: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub name: String,
    pub price: u64,
    pub limit_date: NaiveDate,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    pub name: Option<String>,
    pub price: Option<u64>,
    pub limit_date: Option<NaiveDate>,
    #[serde(rename = "reOrder")]
    pub order: Option<u32>,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct ReorderItem {
    pub id: u64,
    pub order_index: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServerError {
    #[error("todo {0} not found")]
    NotFound(u64),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// In-memory todo table. `todos` is always sorted by `order`, and `order`
/// is always `1..=len`. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct Store {
    todos: Vec<Todo>,
    last_id: u64,
}

impl Store {
    /// All todos in id order. Clients must sort by `order` themselves.
    pub fn list(&self) -> Vec<Todo> {
        let mut todos = self.todos.clone();
        todos.sort_by_key(|t| t.id);
        todos
    }

    /// All todos in display order.
    pub fn ordered(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    pub fn get(&self, id: u64) -> Result<Todo, ServerError> {
        self.position(id).map(|i| self.todos[i].clone())
    }

    pub fn create(&mut self, input: CreateTodo) -> Result<Todo, ServerError> {
        let name = self.checked_name(&input.name, None)?;
        self.last_id += 1;
        let todo = Todo {
            id: self.last_id,
            name,
            price: input.price,
            limit_date: input.limit_date,
            order: self.todos.len() as u32 + 1,
        };
        self.todos.push(todo.clone());
        Ok(todo)
    }

    pub fn update(&mut self, id: u64, input: UpdateTodo) -> Result<Todo, ServerError> {
        let index = self.position(id)?;
        let name = match &input.name {
            Some(name) => Some(self.checked_name(name, Some(id))?),
            None => None,
        };
        if let Some(order) = input.order {
            if order == 0 || order as usize > self.todos.len() {
                return Err(ServerError::BadRequest(format!(
                    "reOrder must be between 1 and {}",
                    self.todos.len()
                )));
            }
        }

        let mut todo = self.todos.remove(index);
        if let Some(name) = name {
            todo.name = name;
        }
        if let Some(price) = input.price {
            todo.price = price;
        }
        if let Some(limit_date) = input.limit_date {
            todo.limit_date = limit_date;
        }
        let target = input.order.map(|o| o as usize - 1).unwrap_or(index);
        self.todos.insert(target, todo);
        self.renumber();
        Ok(self.todos[target].clone())
    }

    pub fn delete(&mut self, id: u64) -> Result<(), ServerError> {
        let index = self.position(id)?;
        self.todos.remove(index);
        self.renumber();
        Ok(())
    }

    /// Every current id exactly once, order indexes forming `1..=len`.
    pub fn reorder(&mut self, items: &[ReorderItem]) -> Result<Vec<Todo>, ServerError> {
        if items.len() != self.todos.len() {
            return Err(ServerError::BadRequest(format!(
                "reorder must list all {} todos, got {}",
                self.todos.len(),
                items.len()
            )));
        }
        let mut seen_ids = HashSet::new();
        let mut seen_indexes = HashSet::new();
        for item in items {
            self.position(item.id)
                .map_err(|_| ServerError::BadRequest(format!("todo {} not found", item.id)))?;
            if !seen_ids.insert(item.id) {
                return Err(ServerError::BadRequest(format!("todo {} listed twice", item.id)));
            }
            if item.order_index == 0 || item.order_index as usize > items.len() {
                return Err(ServerError::BadRequest(format!(
                    "orderIndex {} out of range",
                    item.order_index
                )));
            }
            if !seen_indexes.insert(item.order_index) {
                return Err(ServerError::BadRequest(format!(
                    "orderIndex {} used twice",
                    item.order_index
                )));
            }
        }

        for item in items {
            if let Some(todo) = self.todos.iter_mut().find(|t| t.id == item.id) {
                todo.order = item.order_index;
            }
        }
        self.todos.sort_by_key(|t| t.order);
        Ok(self.todos.clone())
    }

    fn position(&self, id: u64) -> Result<usize, ServerError> {
        self.todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(ServerError::NotFound(id))
    }

    fn checked_name(&self, name: &str, except: Option<u64>) -> Result<String, ServerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServerError::BadRequest("name must not be empty".to_string()));
        }
        let taken = self
            .todos
            .iter()
            .any(|t| Some(t.id) != except && t.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(ServerError::Conflict(format!("a todo named {name:?} already exists")));
        }
        Ok(name.to_string())
    }

    fn renumber(&mut self) {
        for (position, todo) in self.todos.iter_mut().enumerate() {
            todo.order = position as u32 + 1;
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Db::default())
}

/// Router over an existing store, so tests can seed or inspect it.
pub fn router(db: Db) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/health", get(health))
        .route("/todos/reorder", put(reorder_todos))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health() -> &'static str {
    "OK"
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    Json(db.read().await.list())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), ServerError> {
    let todo = db.write().await.create(input)?;
    tracing::debug!(id = todo.id, order = todo.order, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Todo>, ServerError> {
    db.read().await.get(id).map(Json)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ServerError> {
    let todo = db.write().await.update(id, input)?;
    tracing::debug!(id, order = todo.order, "updated todo");
    Ok(Json(todo))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, ServerError> {
    db.write().await.delete(id)?;
    tracing::debug!(id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_todos(
    State(db): State<Db>,
    Json(items): Json<Vec<ReorderItem>>,
) -> Result<Json<Vec<Todo>>, ServerError> {
    let todos = db.write().await.reorder(&items).map_err(|err| {
        tracing::warn!(error = %err, "rejected reorder");
        err
    })?;
    Ok(Json(todos))
}
