use aptwise::commands::USAGE;
use aptwise::{App, Command, Config};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "aptwise", "aptwise") {
        proj_dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config/default.toml")
    }
}

fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    // Logs go to stderr so stdout stays clean for command output.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aptwise=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded .env from: {:?}", path),
        Err(e) => debug!("No .env file loaded: {}", e),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let config_path = get_config_path();
    let config = Config::load_or_default(&config_path).with_env_overrides();
    debug!(path = ?config_path, base_url = %config.api.base_url, "Configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        let app = App::new(&config)?;
        app.execute(command).await
    });
    // A terminal popup may still be blocked reading stdin.
    rt.shutdown_timeout(Duration::from_millis(100));
    result
}
