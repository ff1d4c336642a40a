mod action_id;
mod action_kind;
mod action_status;
mod table_name;

pub use action_id::ActionId;
pub use action_kind::ActionKind;
pub use action_status::ActionStatus;
pub use table_name::TableName;
