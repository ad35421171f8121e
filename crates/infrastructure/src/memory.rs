use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoFilter, TodoId};

use crate::repositories::{RepositoryError, TodoRepository};

/// プロセス内メモリのストア（開発/テスト用）
///
/// 削除済みの ID は再利用しない。
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    todos: BTreeMap<TodoId, Todo>,
    last_assigned: i64,
}

impl MemoryState {
    fn next_id(&self) -> Option<TodoId> {
        let highest = self
            .todos
            .keys()
            .next_back()
            .map(TodoId::value)
            .unwrap_or(0)
            .max(self.last_assigned);
        highest.checked_add(1).and_then(TodoId::new)
    }
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存レコードを投入した状態で作る
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let todos: BTreeMap<TodoId, Todo> = todos.into_iter().map(|t| (t.id, t)).collect();
        Self {
            state: Mutex::new(MemoryState {
                todos,
                last_assigned: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepositoryError> {
        let state = self.lock();
        Ok(state
            .todos
            .values()
            .filter(|todo| filter.matches(todo))
            .cloned()
            .collect())
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>, RepositoryError> {
        Ok(self.lock().todos.get(&id).cloned())
    }

    async fn insert(&self, draft: NewTodo) -> Result<Todo, RepositoryError> {
        let mut state = self.lock();

        let id = match draft.id {
            Some(id) if state.todos.contains_key(&id) => {
                return Err(RepositoryError::Conflict(id));
            }
            Some(id) => id,
            None => {
                let id = state.next_id().ok_or(RepositoryError::IdExhausted)?;
                state.last_assigned = id.value();
                id
            }
        };

        let todo = draft.into_todo(id);
        state.todos.insert(id, todo.clone());
        Ok(todo)
    }

    async fn save(&self, todo: &Todo) -> Result<(), RepositoryError> {
        match self.lock().todos.get_mut(&todo.id) {
            Some(existing) => {
                *existing = todo.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(todo.id)),
        }
    }

    async fn remove(&self, id: TodoId) -> Result<Option<Todo>, RepositoryError> {
        Ok(self.lock().todos.remove(&id))
    }
}
