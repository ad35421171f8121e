//! Todo HTTP API（axum）
//!
//! `/api/v1` 配下に `/health` と Todo の CRUD エンドポイントを提供します。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod service;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use domain::{Clock, SystemClock};
use infrastructure::{InMemoryTodoRepository, TodoRepository};

pub use error::ApiError;
pub use service::TodoService;

/// API のバージョン付きプレフィックス
pub const API_PREFIX: &str = "/api/v1";

/// インメモリストアでルータを構築して返します。
pub fn app() -> Router {
    app_with_state(AppState::default())
}

/// 外部から状態を注入できる版
pub fn app_with_state(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        );

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(middleware::log_request))
        .with_state(state)
}

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    service: Arc<TodoService>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TodoRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            service: Arc::new(TodoService::new(repo, clock)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()), Arc::new(SystemClock))
    }
}
