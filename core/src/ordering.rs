//! Pure helpers for the dense 1-based `order` of a todo collection.

use crate::types::{ReorderRequest, Todo};

/// Stable sort by `order`, ties keep their current relative position.
pub fn sort_by_order(todos: &mut [Todo]) {
    todos.sort_by_key(|todo| todo.order);
}

/// True when `todos` is sorted and its orders are exactly `1..=len`.
pub fn is_dense(todos: &[Todo]) -> bool {
    todos
        .iter()
        .enumerate()
        .all(|(position, todo)| todo.order as usize == position + 1)
}

/// Rewrite every `order` to match the current position.
pub fn renumber(todos: &mut [Todo]) {
    for (position, todo) in todos.iter_mut().enumerate() {
        todo.order = position as u32 + 1;
    }
}

/// Move the element at `from` so it ends up at index `to`, shifting the
/// elements in between. Returns `None` if either index is out of range.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= items.len() || to >= items.len() {
        return None;
    }
    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Some(moved)
}

/// One `(id, position + 1)` entry per todo, in sequence order.
pub fn reorder_requests(todos: &[Todo]) -> Vec<ReorderRequest> {
    todos
        .iter()
        .enumerate()
        .map(|(position, todo)| ReorderRequest {
            id: todo.id,
            order_index: position as u32 + 1,
        })
        .collect()
}
