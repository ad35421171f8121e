use thiserror::Error;

use crate::todo::TodoId;

/// リクエストボディの形状チェックで発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    MalformedRequest(String),

    /// 許可されていないキー（ソート済み）
    #[error("request contains unexpected keys: {}", .0.join(", "))]
    UnexpectedFields(Vec<String>),

    /// 作成時に欠けている必須キー（ソート済み）
    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),
}

impl ValidationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }
}

/// 一覧クエリパラメータの解釈で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// 元の文字列をそのまま保持する
    #[error("window is not a valid integer: {0}")]
    InvalidWindow(String),
}

/// ユースケース層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Todo not found")]
    NotFound(TodoId),

    #[error("Todo already exists: {0}")]
    Conflict(TodoId),

    #[error("Store error: {0}")]
    Store(String),
}
