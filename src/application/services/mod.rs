pub mod cache_service;
pub mod queue_service;
pub mod sync_service;

pub use cache_service::CacheStore;
pub use queue_service::ActionQueue;
pub use sync_service::{EngineStatus, SyncEngine};
