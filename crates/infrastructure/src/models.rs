use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::NaiveDateTime;
use domain::timestamp::{format_fixed, parse_fixed};
use domain::{Todo, TodoFilter, TodoId};

use crate::repositories::RepositoryError;

/// DynamoDB アイテムのエンティティタイプ
pub const ENTITY_TODO: &str = "Todo";
pub const ENTITY_COUNTER: &str = "Counter";

/// 採番カウンタの値を持つ属性名
pub const COUNTER_VALUE: &str = "Value";

/// Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbKeys {
    pub pk: String,
    pub sk: String,
}

impl DynamoDbKeys {
    /// Todo 本体のキー
    ///
    /// ソートキーは ID をゼロ埋めし、クエリ結果が ID 昇順になるようにする。
    pub fn for_todo(id: TodoId) -> Self {
        Self {
            pk: "TODO".to_string(),
            sk: format!("TODO#{:020}", id.value()),
        }
    }

    /// Todo の ID 採番カウンタのキー
    pub fn for_todo_counter() -> Self {
        Self {
            pk: "COUNTER".to_string(),
            sk: "TODO".to_string(),
        }
    }

    /// 全 Todo が入るパーティション
    pub fn todo_partition() -> &'static str {
        "TODO"
    }

    pub fn to_key_map(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(self.pk.clone())),
            ("SK".to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }
}

/// Todo を DynamoDB の属性マップに変換
///
/// 値のない `Description` / `DeadlineAt` は属性ごと省略する。
pub fn todo_to_item(todo: &Todo) -> HashMap<String, AttributeValue> {
    let mut map = DynamoDbKeys::for_todo(todo.id).to_key_map();

    map.insert("EntityType".to_string(), AttributeValue::S(ENTITY_TODO.to_string()));
    map.insert("Id".to_string(), AttributeValue::N(todo.id.value().to_string()));
    map.insert("Title".to_string(), AttributeValue::S(todo.title.clone()));
    if let Some(description) = &todo.description {
        map.insert("Description".to_string(), AttributeValue::S(description.clone()));
    }
    map.insert("Completed".to_string(), AttributeValue::Bool(todo.completed));
    if let Some(deadline_at) = &todo.deadline_at {
        map.insert("DeadlineAt".to_string(), AttributeValue::S(format_fixed(deadline_at)));
    }
    map.insert("CreatedAt".to_string(), AttributeValue::S(format_fixed(&todo.created_at)));
    map.insert("UpdatedAt".to_string(), AttributeValue::S(format_fixed(&todo.updated_at)));

    map
}

/// DynamoDB の属性マップから Todo を復元
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<Todo, RepositoryError> {
    let id = item
        .get("Id")
        .and_then(|v| v.as_n().ok())
        .and_then(|n| TodoId::parse(n))
        .ok_or_else(|| corrupted("Missing or invalid Id"))?;

    let title = item
        .get("Title")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| corrupted("Missing Title"))?
        .clone();

    let description = item.get("Description").and_then(|v| v.as_s().ok()).cloned();

    let completed = *item
        .get("Completed")
        .and_then(|v| v.as_bool().ok())
        .ok_or_else(|| corrupted("Missing Completed"))?;

    let deadline_at = match item.get("DeadlineAt") {
        Some(value) => Some(timestamp_attribute(value, "DeadlineAt")?),
        None => None,
    };

    let created_at = item
        .get("CreatedAt")
        .ok_or_else(|| corrupted("Missing CreatedAt"))
        .and_then(|v| timestamp_attribute(v, "CreatedAt"))?;

    let updated_at = item
        .get("UpdatedAt")
        .ok_or_else(|| corrupted("Missing UpdatedAt"))
        .and_then(|v| timestamp_attribute(v, "UpdatedAt"))?;

    Ok(Todo {
        id,
        title,
        description,
        completed,
        deadline_at,
        created_at,
        updated_at,
    })
}

fn timestamp_attribute(value: &AttributeValue, name: &str) -> Result<NaiveDateTime, RepositoryError> {
    value
        .as_s()
        .ok()
        .and_then(|s| parse_fixed(s))
        .ok_or_else(|| corrupted(&format!("Invalid {name}")))
}

fn corrupted(message: &str) -> RepositoryError {
    RepositoryError::Corrupted(message.to_string())
}

/// `TodoFilter` を DynamoDB の FilterExpression に変換した結果
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub expression: String,
    pub values: HashMap<String, AttributeValue>,
}

impl FilterExpression {
    /// 絞り込みなしなら None
    ///
    /// `DeadlineAt` を持たないアイテムは比較が成立しないため除外される。
    pub fn from_filter(filter: &TodoFilter) -> Option<Self> {
        let mut clauses = Vec::new();
        let mut values = HashMap::new();

        if filter.completed_only() {
            clauses.push("Completed = :completed");
            values.insert(":completed".to_string(), AttributeValue::Bool(true));
        }
        if let Some(bound) = filter.deadline_until() {
            clauses.push("DeadlineAt <= :deadline_until");
            values.insert(
                ":deadline_until".to_string(),
                AttributeValue::S(format_fixed(&bound)),
            );
        }

        if clauses.is_empty() {
            return None;
        }
        Some(Self {
            expression: clauses.join(" AND "),
            values,
        })
    }
}
