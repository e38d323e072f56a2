use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sessiondeck::ui::terminal_guard::install_panic_hook;
use sessiondeck::{util, App, Config};

/// Drive several interactive agent CLI sessions from one terminal
#[derive(Parser, Debug)]
#[command(name = "sessiondeck", version, about)]
struct Args {
    /// Working directory sessions are spawned in (defaults to the current one)
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Agent executable, overriding the config file
    #[arg(long)]
    executable: Option<String>,

    /// Data directory holding config.toml and logs (defaults to ~/.sessiondeck)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    util::init_data_dir(args.data_dir);

    // Log to file (~/.sessiondeck/logs/sessiondeck.log); the terminal belongs to the sessions
    fs::create_dir_all(util::logs_dir())?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let mut config = Config::load();
    if let Some(executable) = args.executable {
        config = config.with_executable(executable);
    }

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let cwd = match args.cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let cwd = cwd
        .canonicalize()
        .with_context(|| format!("working directory {} is not accessible", cwd.display()))?;

    install_panic_hook();
    let mut app = App::new(config, cwd);
    app.run().await
}
