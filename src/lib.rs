pub mod api;
pub mod chat;
pub mod errors;
pub mod faq;
pub mod index;
pub mod init;
pub mod orders;
pub mod query;
pub mod service;
pub mod transformers;
pub mod types;
pub mod util;

pub use chat::ops::FALLBACK_MESSAGE;
pub use chat::order_status::{LOGIN_PROMPT, NO_ORDERS};
pub use errors::AssistantError;
pub use faq::FaqSource;
pub use init::IngestReport;
pub use service::{AssistantService, ServiceState};
