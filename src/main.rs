use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;

use eyre::{Result, bail};
use log::{debug, info};

use yt2md::batch::{self, Outcome, Sink};
use yt2md::config::Config;
use yt2md::fetch::{self, Fetcher};

mod cli;

use cli::Cli;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("yt2md.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yt2md")
        .join("logs")
}

fn tool_available(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn build_after_help(clipboard_tool: &str) -> String {
    let clipboard_line = if tool_available(clipboard_tool) {
        format!("  \x1b[32m✅\x1b[0m {clipboard_tool}")
    } else {
        format!("  \x1b[31m❌\x1b[0m {clipboard_tool}    (not found — needed for --clipboard)")
    };

    let log_path = log_dir().join("yt2md.log");

    format!(
        "\nOPTIONAL TOOLS:\n{clipboard_line}\n\nConfig file: {}\nLogs are written to: {}",
        yt2md::config::config_path().display(),
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        debug!("Ignoring config: {e}");
        Config::default()
    });
    let clipboard_command = config.clipboard_command();

    let after_help = build_after_help(&clipboard_command[0]);
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Collect inputs: from args or stdin
    let inputs = if cli.videos.is_empty() {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    } else {
        cli.videos.clone()
    };
    let inputs: Vec<String> = inputs
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let ids = yt2md::resolve(&inputs);
    if ids.len() < inputs.len() {
        debug!("Dropped {} unrecognised input(s)", inputs.len() - ids.len());
    }
    if ids.is_empty() {
        bail!(
            "no valid video ID provided\n\nUsage: yt2md <URL>...\n       echo <URL> | yt2md\n\nSupported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  <11-character video ID>"
        );
    }

    let lang = config.lang(cli.lang.as_deref());
    let client = fetch::build_client(config.proxy(cli.proxy.as_deref()), config.timeout())?;
    let fetcher = Fetcher::new(client);

    if cli.verbose {
        let config_path = yt2md::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Language: {lang}");
        for (i, id) in ids.iter().enumerate() {
            eprintln!("Video {}: {id} ({})", i + 1, id.watch_url());
        }
    }

    let sink = Sink {
        file: cli.output.clone(),
        clipboard: cli.clipboard.then_some(clipboard_command),
    };

    let mut stdout = io::stdout();
    let outcomes = batch::run(&fetcher, &ids, &lang, &sink, &mut stdout).await?;

    for outcome in outcomes {
        match outcome {
            Outcome::Saved(path) => eprintln!("Markdown saved to {}", path.display()),
            Outcome::Copied => eprintln!("Content copied to clipboard."),
            Outcome::ClipboardFailed(e) => eprintln!("Warning: {e}"),
            Outcome::Printed => {}
        }
    }

    Ok(())
}
