//! Todo のユースケース
//!
//! HTTP 層から受け取った生の入力を検証し、ストアへの操作に変換する。

use std::sync::Arc;

use domain::{
    decode_body, validate_fields, Clock, NewTodo, Todo, TodoError, TodoFilter, TodoId, TodoPatch,
    TODO_CREATE_FIELDS, TODO_CREATE_REQUIRED, TODO_UPDATE_FIELDS,
};
use infrastructure::TodoRepository;
use tracing::{debug, info, instrument};

pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    clock: Arc<dyn Clock>,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 一覧取得
    ///
    /// `completed` が真値なら完了済みのみ、`window` があれば締切が `now + window 日` 以前のもののみ。
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        completed: Option<&str>,
        window: Option<&str>,
    ) -> Result<Vec<Todo>, TodoError> {
        let filter = TodoFilter::from_params(completed, window, self.clock.naive_now())?;
        let todos = self.repo.list(&filter).await?;
        debug!(count = todos.len(), "todos listed");
        Ok(todos)
    }

    pub async fn get(&self, id: TodoId) -> Result<Todo, TodoError> {
        self.repo.get(id).await?.ok_or(TodoError::NotFound(id))
    }

    #[instrument(skip_all)]
    pub async fn create(&self, raw_body: &[u8]) -> Result<Todo, TodoError> {
        let body = decode_body(raw_body)?;
        let fields = validate_fields(body.as_ref(), TODO_CREATE_FIELDS, TODO_CREATE_REQUIRED)?;
        let draft = NewTodo::from_fields(fields, self.clock.naive_now())?;

        let todo = self.repo.insert(draft).await?;
        info!(id = %todo.id, "todo created");
        Ok(todo)
    }

    /// 部分更新
    ///
    /// ボディの検証は存在確認より先に行う。無効なボディなら ID が存在しなくても 400。
    #[instrument(skip(self, raw_body))]
    pub async fn update(&self, id: TodoId, raw_body: &[u8]) -> Result<Todo, TodoError> {
        let body = decode_body(raw_body)?;
        let fields = validate_fields(body.as_ref(), TODO_UPDATE_FIELDS, &[])?;
        let patch = TodoPatch::from_fields(fields)?;

        let mut todo = self.get(id).await?;
        todo.apply(patch, self.clock.naive_now());
        self.repo.save(&todo).await?;

        info!(id = %todo.id, "todo updated");
        Ok(todo)
    }

    /// 削除（冪等）
    ///
    /// 存在しなければ `None` を返し、エラーにはしない。
    #[instrument(skip(self))]
    pub async fn delete(&self, id: TodoId) -> Result<Option<Todo>, TodoError> {
        let removed = self.repo.remove(id).await?;
        if removed.is_some() {
            info!(%id, "todo deleted");
        }
        Ok(removed)
    }
}
