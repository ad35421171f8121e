use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoError, TodoFilter, TodoId};
use thiserror::Error;

/// ストア層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// 指定 ID のレコードが既に存在する
    #[error("Todo already exists: {0}")]
    Conflict(TodoId),

    /// 更新対象のレコードが存在しない（削除済みを含む）
    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    /// スロットリングなど再試行で回復しうるエラー
    #[error("DynamoDB throttled: {0}")]
    Throttled(String),

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    /// 保存済みアイテムを Todo に復元できない
    #[error("Corrupted item: {0}")]
    Corrupted(String),

    /// 採番できる ID が残っていない
    #[error("Todo id space exhausted")]
    IdExhausted,
}

impl RepositoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::Throttled(_))
    }
}

impl From<RepositoryError> for TodoError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict(id) => TodoError::Conflict(id),
            RepositoryError::NotFound(id) => TodoError::NotFound(id),
            other => TodoError::Store(other.to_string()),
        }
    }
}

/// Todo レコードストア
///
/// 一覧は `TodoFilter` を受け取り、各実装が自前のクエリに変換する。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// 条件に一致する Todo を ID 昇順で返す
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepositoryError>;

    async fn get(&self, id: TodoId) -> Result<Option<Todo>, RepositoryError>;

    /// 新規作成
    ///
    /// `draft.id` が指定されていればその ID で保存し、使用済みなら `Conflict`。
    /// 未指定なら未使用の ID を採番する。
    async fn insert(&self, draft: NewTodo) -> Result<Todo, RepositoryError>;

    /// 既存レコードの上書き保存
    ///
    /// レコードが存在しなければ書き込まずに `NotFound`。削除済みの Todo を復活させない。
    async fn save(&self, todo: &Todo) -> Result<(), RepositoryError>;

    /// 削除し、削除直前のレコードを返す（存在しなければ None）
    async fn remove(&self, id: TodoId) -> Result<Option<Todo>, RepositoryError>;
}
