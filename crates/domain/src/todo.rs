use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::timestamp::parse_iso8601;

/// Todo の主キー（ストアが採番する正の整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    /// 1 未満は ID として扱わない
    pub fn new(value: i64) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    /// パスパラメータなどの文字列から解析
    ///
    /// 数字のみを受け付ける（符号や空白は不可）。
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().and_then(Self::new)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// 次の ID（オーバーフロー時は None）
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Todo {
    /// 部分更新を適用する
    ///
    /// パッチに含まれるフィールドだけを上書きし、`updated_at` を進める。
    /// 時計が巻き戻っても `updated_at` は後退しない。
    pub fn apply(&mut self, patch: TodoPatch, now: NaiveDateTime) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(deadline_at) = patch.deadline_at {
            self.deadline_at = deadline_at;
        }
        self.updated_at = self.updated_at.max(now);
    }
}

/// 作成リクエストから組み立てた未採番の Todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    /// クライアント指定の ID（None ならストアが採番）
    pub id: Option<TodoId>,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl NewTodo {
    /// 検証済みのフィールドから型付きの値を取り出す
    pub fn from_fields(fields: &Map<String, Value>, now: NaiveDateTime) -> Result<Self, ValidationError> {
        let id = match fields.get("id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .and_then(TodoId::new)
                    .ok_or_else(|| invalid_type("id", "a positive integer"))?,
            ),
        };

        let title = match fields.get("title") {
            Some(value) => string_value("title", value)?,
            None => return Err(ValidationError::MissingRequiredFields(vec!["title".into()])),
        };

        let description = match fields.get("description") {
            Some(value) => nullable_string_value("description", value)?,
            None => None,
        };

        let completed = match fields.get("completed") {
            None | Some(Value::Null) => false,
            Some(value) => bool_value("completed", value)?,
        };

        let deadline_at = match fields.get("deadline_at") {
            Some(value) => nullable_timestamp_value("deadline_at", value)?,
            None => None,
        };

        Ok(Self {
            id,
            title,
            description,
            completed,
            deadline_at,
            created_at: now,
        })
    }

    /// 採番済みの ID を割り当てて Todo にする
    pub fn into_todo(self, id: TodoId) -> Todo {
        Todo {
            id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            deadline_at: self.deadline_at,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// 更新リクエストの差分
///
/// 外側の `Option` は「フィールドが送られたか」、内側は「null で消去するか」を表す。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub deadline_at: Option<Option<NaiveDateTime>>,
}

impl TodoPatch {
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut patch = Self::default();

        if let Some(value) = fields.get("title") {
            patch.title = Some(string_value("title", value)?);
        }
        if let Some(value) = fields.get("description") {
            patch.description = Some(nullable_string_value("description", value)?);
        }
        if let Some(value) = fields.get("completed") {
            patch.completed = Some(bool_value("completed", value)?);
        }
        if let Some(value) = fields.get("deadline_at") {
            patch.deadline_at = Some(nullable_timestamp_value("deadline_at", value)?);
        }

        Ok(patch)
    }
}

fn invalid_type(field: &str, expected: &str) -> ValidationError {
    ValidationError::malformed(format!("field '{field}' must be {expected}"))
}

fn string_value(field: &str, value: &Value) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_type(field, "a string"))
}

fn nullable_string_value(field: &str, value: &Value) -> Result<Option<String>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(invalid_type(field, "a string or null")),
    }
}

fn bool_value(field: &str, value: &Value) -> Result<bool, ValidationError> {
    value.as_bool().ok_or_else(|| invalid_type(field, "a boolean"))
}

fn nullable_timestamp_value(
    field: &str,
    value: &Value,
) -> Result<Option<NaiveDateTime>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => parse_iso8601(raw).map(Some).ok_or_else(|| {
            ValidationError::malformed(format!(
                "field '{field}' is not a valid ISO-8601 timestamp: {raw}"
            ))
        }),
        _ => Err(invalid_type(field, "an ISO-8601 string or null")),
    }
}
