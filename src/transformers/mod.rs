pub mod http_handler;
pub mod providers;
pub mod types;
