pub mod ask_controller;
pub mod delete_controller;
pub mod health_controller;
pub mod ingest_controller;
pub mod list_repositories_controller;
pub mod selection_controller;
pub mod watch_controller;

pub use ask_controller::AskController;
pub use delete_controller::DeleteController;
pub use health_controller::HealthController;
pub use ingest_controller::IngestController;
pub use list_repositories_controller::ListRepositoriesController;
pub use selection_controller::SelectionController;
pub use watch_controller::WatchController;
