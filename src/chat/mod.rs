pub mod ops;
pub mod order_status;
pub mod types;
