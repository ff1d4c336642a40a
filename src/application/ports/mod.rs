pub mod offline_store;
pub mod remote_backend;

pub use offline_store::OfflineStore;
pub use remote_backend::RemoteBackend;
