mod ask_question;
mod ingest_repository;
mod registry_sync;
mod repository_registry;
mod selection;

pub use ask_question::*;
pub use ingest_repository::*;
pub use registry_sync::*;
pub use repository_registry::*;
pub use selection::*;
