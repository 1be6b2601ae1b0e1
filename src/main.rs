use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use codenav::{Commands, Container, ContainerConfig, Router};

#[derive(Parser)]
#[command(name = "codenav")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend API base URL [env: CODENAV_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Local state directory [env: CODENAV_DATA_DIR]
    #[arg(short, long, global = true)]
    data_dir: Option<String>,

    #[arg(long, global = true)]
    memory_storage: bool,

    #[arg(long, global = true)]
    mock_backend: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> ContainerConfig {
        let mut config = ContainerConfig::from_env();
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config.memory_storage = self.memory_storage;
        config.mock_backend = self.mock_backend;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.config())?;
    let result = Router::new(&container).route(cli.command).await;
    container.shutdown();

    println!("{}", result?);
    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn ask_requires_a_query() {
        let res = Cli::try_parse_from(["codenav", "ask"]);
        assert!(res.is_err(), "ask without words should be rejected");
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::try_parse_from([
            "codenav",
            "list",
            "--api-url",
            "http://backend:9000/api",
            "--memory-storage",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.api_url, "http://backend:9000/api");
        assert!(config.memory_storage);
        assert!(!config.mock_backend);
    }

    #[test]
    fn clear_all_is_kebab_case() {
        let cli = Cli::try_parse_from(["codenav", "clear-all"]).unwrap();
        assert!(matches!(cli.command, Commands::ClearAll));
    }
}
