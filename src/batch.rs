use std::io::Write;
use std::path::PathBuf;

use futures::future::try_join_all;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::fetch::{Fetcher, Transport};
use crate::{VideoId, VideoRecord, clipboard, output, youtube};

/// Where the rendered Markdown goes
#[derive(Debug, Default, Clone)]
pub struct Sink {
    /// Overwrite this file with the Markdown
    pub file: Option<PathBuf>,
    /// Pipe the Markdown into this clipboard command
    pub clipboard: Option<Vec<String>>,
}

/// What happened to the Markdown, for user-facing status lines
#[derive(Debug)]
pub enum Outcome {
    Saved(PathBuf),
    Copied,
    ClipboardFailed(Error),
    Printed,
}

impl Sink {
    /// Write to the file and/or clipboard; print to `stdout` only if neither was requested
    pub fn deliver(&self, markdown: &str, stdout: &mut impl Write) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::new();

        if let Some(ref path) = self.file {
            std::fs::write(path, markdown)?;
            info!("Markdown saved to {}", path.display());
            outcomes.push(Outcome::Saved(path.clone()));
        }

        if let Some(ref command) = self.clipboard {
            match clipboard::copy(command, markdown) {
                Ok(()) => outcomes.push(Outcome::Copied),
                Err(e) => {
                    warn!("Clipboard copy failed: {e}");
                    outcomes.push(Outcome::ClipboardFailed(e));
                }
            }
        }

        if self.file.is_none() && self.clipboard.is_none() {
            writeln!(stdout, "{markdown}")?;
            outcomes.push(Outcome::Printed);
        }

        Ok(outcomes)
    }
}

/// Fetch every video concurrently; results come back in `ids` order.
///
/// The first failing video fails the batch and the remaining pipelines are dropped.
pub async fn collect<T: Transport>(fetcher: &Fetcher<T>, ids: &[VideoId], lang: &str) -> Result<Vec<VideoRecord>> {
    info!("Processing {} video(s), subtitle language {lang}", ids.len());
    let records = try_join_all(ids.iter().map(|id| youtube::fetch_video(fetcher, id, lang))).await?;
    info!("Fetched {} video(s)", records.len());
    Ok(records)
}

/// Fetch, render and deliver a batch of videos
pub async fn run<T: Transport>(
    fetcher: &Fetcher<T>,
    ids: &[VideoId],
    lang: &str,
    sink: &Sink,
    stdout: &mut impl Write,
) -> Result<Vec<Outcome>> {
    let records = collect(fetcher, ids, lang).await?;
    let markdown = output::render_all(&records);
    sink.deliver(&markdown, stdout)
}
