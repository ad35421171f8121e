use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::{Todo, TodoId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

/// 一覧取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub completed: Option<String>,
    pub window: Option<String>,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

pub async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let todos = state
        .service
        .list(params.completed.as_deref(), params.window.as_deref())
        .await?;
    Ok(Json(todos))
}

pub async fn create_todo(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let todo = state.service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(todo)).into_response())
}

pub async fn get_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(state.service.get(id).await?))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&raw_id)?;
    let todo = state.service.update(id, &body).await?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;

    // 存在しない ID も成功扱い（空オブジェクト）
    let response = match state.service.delete(id).await? {
        Some(todo) => Json(todo).into_response(),
        None => Json(serde_json::json!({})).into_response(),
    };
    Ok(response)
}

pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// パスの ID を解釈する
///
/// 正の整数でなければルート不一致として扱い、メソッドによらず 404。
fn parse_id(raw: &str) -> Result<TodoId, ApiError> {
    TodoId::parse(raw).ok_or(ApiError::NotFound)
}
