use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "yt2md",
    about = "Convert YouTube videos to Markdown",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URLs or IDs (reads one per line from stdin if omitted)
    pub videos: Vec<String>,

    /// Write Markdown to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Copy the Markdown to the clipboard
    #[arg(short, long, visible_alias = "cp")]
    pub clipboard: bool,

    /// Subtitle language code [default: config default_lang, else "ru"]
    #[arg(short, long, visible_alias = "language")]
    pub lang: Option<String>,

    /// Forward proxy for all requests (http://, https:// or socks5://)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Show per-video details on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
