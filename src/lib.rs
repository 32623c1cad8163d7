pub mod batch;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

pub use error::{Error, Result};

static URL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|youtu\.be/)([a-zA-Z0-9_-]{11})").expect("valid regex"));

static BARE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid regex"));

/// An 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts only a string that is exactly an 11-character ID
    pub fn parse(s: &str) -> Option<Self> {
        BARE_ID_RE.is_match(s).then(|| VideoId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.0)
    }

    pub fn short_url(&self, seconds: u64) -> String {
        format!("https://youtu.be/{}?t={seconds}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata projected from the embedded player response
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub views: u64,
    pub published: String,
    pub tags: Vec<String>,
    pub duration_secs: u64,
}

/// A single timed caption line
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// Everything known about one video, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: VideoId,
    pub metadata: VideoMetadata,
    pub cues: Vec<SubtitleCue>,
}

/// Extract a video ID from a watch URL, a short URL or a bare ID
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    // watch?v=ID or youtu.be/ID, anywhere in the input
    if let Some(caps) = URL_ID_RE.captures(input) {
        return Some(VideoId(caps[1].to_string()));
    }

    VideoId::parse(input)
}

/// Resolve user inputs to video IDs, keeping input order and dropping anything unrecognised
pub fn resolve<S: AsRef<str>>(inputs: &[S]) -> Vec<VideoId> {
    inputs.iter().filter_map(|s| extract_video_id(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Option<VideoId> {
        VideoId::parse(s)
    }

    #[test]
    fn test_bare_video_id() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            id("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=120"),
            id("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_short_url_with_timestamp() {
        assert_eq!(extract_video_id("youtu.be/a-b_c1234XY?t=42"), id("a-b_c1234XY"));
    }

    #[test]
    fn test_embed_url_is_not_recognised() {
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(extract_video_id("not-a-valid-id"), None);
        assert_eq!(extract_video_id("short"), None);
        assert_eq!(extract_video_id("dQw4w9WgXc!"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_untrimmed_bare_id_is_rejected() {
        assert_eq!(extract_video_id("  dQw4w9WgXcQ  "), None);
    }

    #[test]
    fn test_resolve_keeps_order_and_drops_unmatched() {
        let inputs = [
            "https://youtu.be/BBBBBBBBBBB",
            "garbage",
            "AAAAAAAAAAA",
            "https://www.youtube.com/watch?v=CCCCCCCCCCC",
            "https://example.com/page",
        ];
        let ids = resolve(&inputs);
        let ids: Vec<&str> = ids.iter().map(VideoId::as_str).collect();
        assert_eq!(ids, ["BBBBBBBBBBB", "AAAAAAAAAAA", "CCCCCCCCCCC"]);
    }

    #[test]
    fn test_resolve_never_grows() {
        let inputs = ["", "x", "1234567890", "123456789012", "https://youtu.be/short"];
        let ids = resolve(&inputs);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_video_id_urls() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.watch_url(), "https://youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(id.short_url(83), "https://youtu.be/dQw4w9WgXcQ?t=83");
        assert_eq!(id.to_string(), "dQw4w9WgXcQ");
    }
}
