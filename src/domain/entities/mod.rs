mod cache_entry;
mod queue_stats;
mod queued_action;
mod sync_report;

pub use cache_entry::CacheEntry;
pub use queue_stats::QueueStats;
pub use queued_action::{ActionDraft, QueuedAction};
pub use sync_report::{SyncFailure, SyncReport};
