pub mod database;
pub mod event;
pub mod network;
pub mod offline;
