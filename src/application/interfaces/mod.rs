mod chat_service;
mod clock;
mod key_value_store;
mod repository_backend;

pub use chat_service::*;
pub use clock::*;
pub use key_value_store::*;
pub use repository_backend::*;
