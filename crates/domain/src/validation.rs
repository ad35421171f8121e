//! リクエストボディのフィールド集合チェック
//!
//! 永続化の前に「許可されたキーの部分集合か」「必須キーを含むか」だけを判定する。
//! 値の型チェックは `NewTodo` / `TodoPatch` の構築時に行う。

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::errors::ValidationError;

/// 固定のフィールド名集合
pub type FieldSet = &'static [&'static str];

/// 更新時に書き換え可能なフィールド
pub const TODO_UPDATE_FIELDS: FieldSet = &["title", "description", "completed", "deadline_at"];

/// 作成時に受け付けるフィールド（更新フィールド + id）
pub const TODO_CREATE_FIELDS: FieldSet = &["id", "title", "description", "completed", "deadline_at"];

/// 作成時の必須フィールド
pub const TODO_CREATE_REQUIRED: FieldSet = &["title"];

/// サーバーが設定するフィールド（クライアントからは書き込めない）
pub const TODO_SERVER_FIELDS: FieldSet = &["created_at", "updated_at"];

/// 生のリクエストボディを JSON として読む
///
/// 空ボディは `None`。JSON として壊れている場合は `MalformedRequest`。
pub fn decode_body(raw: &[u8]) -> Result<Option<Value>, ValidationError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| ValidationError::malformed(format!("request body is not valid json: {e}")))
}

/// ボディのキー集合を検証し、検証済みのオブジェクトを返す
///
/// 1. ボディが空でない JSON オブジェクトであること
/// 2. すべてのキーが `allowed` に含まれること
/// 3. `required` のキーがすべて存在すること
pub fn validate_fields<'a>(
    body: Option<&'a Value>,
    allowed: FieldSet,
    required: FieldSet,
) -> Result<&'a Map<String, Value>, ValidationError> {
    let fields = match body {
        Some(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ValidationError::malformed("request missing json")),
    };

    let unexpected: BTreeSet<&str> = fields
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.iter().any(|field| field == key))
        .collect();
    if !unexpected.is_empty() {
        return Err(ValidationError::UnexpectedFields(to_owned(unexpected)));
    }

    let missing: BTreeSet<&str> = required
        .iter()
        .copied()
        .filter(|key| !fields.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingRequiredFields(to_owned(missing)));
    }

    Ok(fields)
}

fn to_owned(keys: BTreeSet<&str>) -> Vec<String> {
    keys.into_iter().map(str::to_string).collect()
}
