use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use domain::{NewTodo, Todo, TodoFilter, TodoId};
use tracing::{debug, error};

use crate::dynamodb::DynamoDbClient;
use crate::models::{
    item_to_todo, todo_to_item, DynamoDbKeys, FilterExpression, COUNTER_VALUE, ENTITY_COUNTER,
};
use crate::repositories::{RepositoryError, TodoRepository};
use crate::retry::{retry_with_backoff, RetryConfig};

const THROTTLING_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
];

/// DynamoDB 実装の TodoRepository
///
/// 全 Todo を単一パーティションに置き、ID はカウンタアイテムの `ADD` で採番する。
#[derive(Debug, Clone)]
pub struct DynamoTodoRepository {
    db: DynamoDbClient,
    retry: RetryConfig,
}

impl DynamoTodoRepository {
    pub fn new(db: DynamoDbClient, retry: RetryConfig) -> Self {
        Self { db, retry }
    }

    /// 条件付き Put（同じキーが存在すれば `Conflict`）
    async fn put_new(&self, todo: &Todo) -> Result<(), RepositoryError> {
        debug!(table = self.db.table_name(), id = %todo.id, "PutItem (new todo)");

        let result = self
            .db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(RepositoryError::Conflict(todo.id))
            }
            Err(err) => Err(sdk_error("PutItem", err)),
        }
    }

    /// カウンタを 1 進めて次の ID を得る
    async fn next_id(&self) -> Result<TodoId, RepositoryError> {
        let output = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo_counter().to_key_map()))
            .update_expression("SET EntityType = :entity ADD #value :one")
            .expression_attribute_names("#value", COUNTER_VALUE)
            .expression_attribute_values(":entity", AttributeValue::S(ENTITY_COUNTER.to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| sdk_error("UpdateItem", e))?;

        output
            .attributes()
            .and_then(|attrs| attrs.get(COUNTER_VALUE))
            .and_then(|v| v.as_n().ok())
            .and_then(|n| TodoId::parse(n))
            .ok_or_else(|| RepositoryError::Corrupted("Invalid todo counter value".to_string()))
    }

    /// カウンタがクライアント指定の ID 未満なら引き上げる
    ///
    /// 後続の自動採番が指定 ID と衝突し続けないようにする。
    async fn raise_counter_to(&self, id: TodoId) -> Result<(), RepositoryError> {
        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo_counter().to_key_map()))
            .update_expression("SET EntityType = :entity, #value = :id")
            .condition_expression("attribute_not_exists(#value) OR #value < :id")
            .expression_attribute_names("#value", COUNTER_VALUE)
            .expression_attribute_values(":entity", AttributeValue::S(ENTITY_COUNTER.to_string()))
            .expression_attribute_values(":id", AttributeValue::N(id.value().to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Ok(())
            }
            Err(err) => Err(sdk_error("UpdateItem", err)),
        }
    }

    async fn insert_with_next_id(&self, draft: NewTodo) -> Result<Todo, RepositoryError> {
        let id = self.next_id().await?;
        let todo = draft.into_todo(id);
        self.put_new(&todo).await?;
        Ok(todo)
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>, RepositoryError> {
        let filter_expression = FilterExpression::from_filter(filter);
        let mut todos = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            debug!(table = self.db.table_name(), ?filter, "Query todos");

            let mut request = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(
                    ":pk",
                    AttributeValue::S(DynamoDbKeys::todo_partition().to_string()),
                )
                .set_exclusive_start_key(start_key.take());

            if let Some(expr) = &filter_expression {
                request = request.filter_expression(expr.expression.clone());
                for (name, value) in &expr.values {
                    request = request.expression_attribute_values(name.clone(), value.clone());
                }
            }

            let output = request.send().await.map_err(|e| sdk_error("Query", e))?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(todos)
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>, RepositoryError> {
        debug!(table = self.db.table_name(), %id, "GetItem");

        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .send()
            .await
            .map_err(|e| sdk_error("GetItem", e))?;

        output.item().map(item_to_todo).transpose()
    }

    async fn insert(&self, draft: NewTodo) -> Result<Todo, RepositoryError> {
        if let Some(id) = draft.id {
            let todo = draft.into_todo(id);
            self.put_new(&todo).await?;
            self.raise_counter_to(id).await?;
            return Ok(todo);
        }

        // 採番した ID がクライアント指定の ID と衝突した場合は採番からやり直す
        retry_with_backoff(
            || self.insert_with_next_id(draft.clone()),
            &self.retry,
            |e: &RepositoryError| e.is_retryable() || matches!(e, RepositoryError::Conflict(_)),
        )
        .await
    }

    async fn save(&self, todo: &Todo) -> Result<(), RepositoryError> {
        debug!(table = self.db.table_name(), id = %todo.id, "PutItem (update)");

        let result = self
            .db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(RepositoryError::NotFound(todo.id))
            }
            Err(err) => Err(sdk_error("PutItem", err)),
        }
    }

    async fn remove(&self, id: TodoId) -> Result<Option<Todo>, RepositoryError> {
        debug!(table = self.db.table_name(), %id, "DeleteItem");

        let output = self
            .db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteItem", e))?;

        output.attributes().map(item_to_todo).transpose()
    }
}

fn sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> RepositoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    error!(operation, error = %message, "DynamoDB operation failed");
    classify_error(err.code(), message)
}

/// エラーコードからリトライ可否を判定する
fn classify_error(code: Option<&str>, message: String) -> RepositoryError {
    match code {
        Some(code) if THROTTLING_CODES.iter().any(|c| *c == code) => RepositoryError::Throttled(message),
        _ => RepositoryError::DynamoDb(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttling_codes_are_retryable() {
        for code in THROTTLING_CODES {
            let err = classify_error(Some(*code), "slow down".into());
            assert!(err.is_retryable(), "{code} should be retryable");
        }
    }

    #[test]
    fn test_other_codes_are_fatal() {
        let err = classify_error(Some("ResourceNotFoundException"), "no table".into());
        assert_eq!(err, RepositoryError::DynamoDb("no table".into()));

        let err = classify_error(None, "dispatch failure".into());
        assert!(!err.is_retryable());
    }
}
