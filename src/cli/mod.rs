use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Sync and list connected repositories
    List,

    /// Keep the repository list synced and print every change
    Watch,

    /// Submit a repository URL for indexing and follow its progress
    Ingest { url: String },

    /// Make a repository the active chat context
    Select { id: String },

    /// Show the active repository
    Selected,

    /// Clear the active repository
    Unselect,

    /// Ask the code assistant a question
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Remove one repository from the backend
    Remove { id: String },

    /// Remove every repository from the backend
    ClearAll,

    /// Check that the backend is reachable
    Health,
}
