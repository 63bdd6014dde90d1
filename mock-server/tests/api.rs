use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use chrono::NaiveDate;
use mock_server::{app, router, CreateTodo, Db, Todo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn create_body(name: &str) -> String {
    format!(r#"{{"name":"{name}","price":250,"limitDate":"2024-07-01"}}"#)
}

// --- health ---

#[tokio::test]
async fn health_returns_ok() {
    let resp = app().oneshot(empty_request("GET", "/todos/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"OK");
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app().oneshot(empty_request("GET", "/todos")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_todo_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", &create_body("Buy milk")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let todo: Todo = body_json(resp).await;
    assert_eq!(todo.name, "Buy milk");
    assert_eq!(todo.price, 250);
    assert_eq!(todo.id, 1);
    assert_eq!(todo.order, 1);
}

#[tokio::test]
async fn create_todo_blank_name_returns_400_with_message() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", &create_body(" ")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["error"], "name must not be empty");
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", r#"{"not_name":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_todo_negative_price_is_rejected() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/todos",
            r#"{"name":"x","price":-1,"limitDate":"2024-07-01"}"#,
        ))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- get ---

#[tokio::test]
async fn get_todo_not_found() {
    let resp = app().oneshot(empty_request("GET", "/todos/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_todo_bad_id_returns_400() {
    let resp = app().oneshot(empty_request("GET", "/todos/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- update ---

#[tokio::test]
async fn update_todo_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/todos/99", r#"{"name":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- delete ---

#[tokio::test]
async fn delete_todo_not_found() {
    let resp = app().oneshot(empty_request("DELETE", "/todos/99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- reorder ---

#[tokio::test]
async fn reorder_of_empty_collection_is_empty() {
    let resp = app()
        .oneshot(json_request("PUT", "/todos/reorder", "[]"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

#[tokio::test]
async fn reorder_unknown_id_returns_400() {
    let resp = app()
        .oneshot(json_request("PUT", "/todos/reorder", r#"[{"id":1,"orderIndex":1}]"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle ---

#[tokio::test]
async fn crud_and_reorder_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create three
    for name in ["Walk dog", "Pay rent", "Call mom"] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("POST", "/todos", &create_body(name)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // duplicate name conflicts
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/todos", &create_body("pay rent")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // reorder: 2, 3, 1
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            "/todos/reorder",
            r#"[{"id":2,"orderIndex":1},{"id":3,"orderIndex":2},{"id":1,"orderIndex":3}]"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    let ids: Vec<u64> = todos.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    let orders: Vec<u32> = todos.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);

    // partial update keeps untouched fields
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/todos/1", r#"{"price":999}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.name, "Walk dog");
    assert_eq!(updated.price, 999);
    assert_eq!(updated.order, 3);

    // delete the first in display order; the rest close up
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", "/todos/2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/todos/1"))
        .await
        .unwrap();
    let fetched: Todo = body_json(resp).await;
    assert_eq!(fetched.order, 2);

    // get after delete — 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/todos/2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/todos"))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.len(), 2);
}

// --- shared store ---

#[tokio::test]
async fn router_serves_a_seeded_store() {
    let db = Db::default();
    for name in ["Milk", "Bread", "Eggs"] {
        db.write()
            .await
            .create(CreateTodo {
                name: name.to_string(),
                price: 100,
                limit_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            })
            .unwrap();
    }

    let resp = router(db.clone())
        .oneshot(empty_request("DELETE", "/todos/1"))
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let remaining = db.read().await.ordered();
    let names: Vec<&str> = remaining.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Bread", "Eggs"]);
    let orders: Vec<u32> = remaining.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![1, 2]);
}
