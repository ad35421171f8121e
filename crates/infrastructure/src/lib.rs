pub mod dynamo_repository;
pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod retry;

pub use dynamo_repository::*;
pub use dynamodb::*;
pub use memory::*;
pub use models::*;
pub use repositories::*;
pub use retry::*;
