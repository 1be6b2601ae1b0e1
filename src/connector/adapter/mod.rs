mod clock;
mod http_backend_client;
mod mock_backend;

pub use clock::*;
pub use http_backend_client::*;
pub use mock_backend::*;
