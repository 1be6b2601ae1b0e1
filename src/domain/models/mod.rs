mod chat;
mod ingestion;
mod repository;

pub use chat::*;
pub use ingestion::*;
pub use repository::*;
