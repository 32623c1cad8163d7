use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use regex::Regex;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fetch::{Fetcher, Transport};
use crate::{SubtitleCue, VideoId, VideoMetadata, VideoRecord};

/// Placeholder for a missing title or publish date
pub const NOT_AVAILABLE: &str = "N/A";

const PUBLISHED_FORMAT: &str = "%d %B %Y, %H:%M";

static PLAYER_RESPONSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlayerResponse {
    #[serde(rename = "videoDetails", deserialize_with = "lenient")]
    video_details: Option<VideoDetails>,
    #[serde(deserialize_with = "lenient")]
    microformat: Option<Microformat>,
    #[serde(deserialize_with = "lenient")]
    captions: Option<CaptionsData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoDetails {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(rename = "shortDescription", deserialize_with = "lenient")]
    short_description: Option<String>,
    #[serde(rename = "viewCount", deserialize_with = "lenient")]
    view_count: Option<Count>,
    #[serde(rename = "lengthSeconds", deserialize_with = "lenient")]
    length_seconds: Option<Count>,
    #[serde(deserialize_with = "lenient")]
    keywords: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Microformat {
    #[serde(rename = "playerMicroformatRenderer", deserialize_with = "lenient")]
    renderer: Option<MicroformatRenderer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MicroformatRenderer {
    #[serde(rename = "publishDate", deserialize_with = "lenient")]
    publish_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer", deserialize_with = "lenient")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks", deserialize_with = "lenient")]
    caption_tracks: Option<Vec<Value>>,
}

/// Counts arrive as JSON strings ("12345") or numbers depending on the page
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    fn value(&self) -> Option<u64> {
        match self {
            Count::Number(n) => Some(*n),
            Count::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A field of the wrong type reads as absent instead of failing the whole document
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// A caption track advertised by the watch page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub base_url: String,
}

/// Locate and parse the `ytInitialPlayerResponse` object embedded in a watch page.
///
/// This is the only place that knows the page layout; when YouTube changes it,
/// this function changes and nothing else does.
fn player_response(html: &str) -> Result<PlayerResponse> {
    let m = PLAYER_RESPONSE_RE
        .find(html)
        .ok_or_else(|| Error::Extraction("ytInitialPlayerResponse not found in page".to_string()))?;

    // The match ends on the opening brace; read exactly one JSON value from there
    let json_start = m.end() - 1;
    let mut stream = serde_json::Deserializer::from_str(&html[json_start..]).into_iter::<PlayerResponse>();

    match stream.next() {
        Some(Ok(resp)) => Ok(resp),
        Some(Err(e)) => Err(Error::Extraction(format!("invalid ytInitialPlayerResponse JSON: {e}"))),
        None => Err(Error::Extraction("empty ytInitialPlayerResponse".to_string())),
    }
}

/// Extract video metadata from a watch page
pub fn extract_metadata(html: &str) -> Result<VideoMetadata> {
    let resp = player_response(html)?;
    let details = resp.video_details.unwrap_or_default();

    let published = resp
        .microformat
        .and_then(|m| m.renderer)
        .and_then(|r| r.publish_date)
        .as_deref()
        .and_then(format_publish_date)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let tags = details
        .keywords
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect();

    Ok(VideoMetadata {
        title: details.title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        description: details.short_description.unwrap_or_default(),
        views: details.view_count.as_ref().and_then(Count::value).unwrap_or(0),
        published,
        tags,
        duration_secs: details.length_seconds.as_ref().and_then(Count::value).unwrap_or(0),
    })
}

/// Reformat an ISO-8601 publish date; `None` when it does not parse
pub fn format_publish_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format(PUBLISHED_FORMAT).to_string());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.format(PUBLISHED_FORMAT).to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.format(PUBLISHED_FORMAT).to_string());
    }

    debug!("Unparsable publish date: {raw:?}");
    None
}

/// Caption tracks listed on a watch page, in page order; tracks without a URL are skipped
pub fn caption_tracks(html: &str) -> Result<Vec<CaptionTrack>> {
    let tracks = player_response(html)?
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    Ok(tracks
        .iter()
        .filter_map(|t| {
            let base_url = t.get("baseUrl")?.as_str()?.to_string();
            let language_code = t
                .get("languageCode")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some(CaptionTrack {
                language_code,
                base_url,
            })
        })
        .collect())
}

/// Pick a track: requested language, then en-US, then en, then whatever comes first
pub fn select_track<'a>(tracks: &'a [CaptionTrack], lang: &str) -> Option<&'a CaptionTrack> {
    [lang, "en-US", "en"]
        .iter()
        .find_map(|code| tracks.iter().find(|t| t.language_code == *code))
        .or_else(|| tracks.first())
}

/// URL of the caption track to fetch for `lang`, if the page has any
pub fn select_caption_url(html: &str, lang: &str) -> Option<String> {
    let tracks = match caption_tracks(html) {
        Ok(tracks) => tracks,
        Err(e) => {
            debug!("No caption tracks: {e}");
            return None;
        }
    };

    let track = select_track(&tracks, lang)?;
    debug!("Using caption track: lang={}", track.language_code);
    Some(track.base_url.clone())
}

fn parse_seconds(raw: &[u8]) -> f64 {
    String::from_utf8_lossy(raw)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn cue_timing(e: &quick_xml::events::BytesStart) -> (f64, f64) {
    let mut start = 0.0;
    let mut duration = 0.0;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"start" => start = parse_seconds(&attr.value),
            b"dur" => duration = parse_seconds(&attr.value),
            _ => {}
        }
    }
    (start, duration)
}

fn finish_cue(start: f64, duration: f64, raw_text: &str) -> SubtitleCue {
    let text = html_escape::decode_html_entities(raw_text).trim().to_string();
    SubtitleCue { start, duration, text }
}

/// Parse a timed-text document (`<transcript><text start=".." dur="..">..</text>..`)
///
/// The document must be well formed: one root element, every element closed.
pub fn parse_caption_xml(xml: &str) -> Result<Vec<SubtitleCue>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut cues = Vec::new();
    // timing and accumulated text of the <text> element being read
    let mut current: Option<(f64, f64, String)> = None;
    let mut depth = 0usize;
    let mut seen_root = false;

    let mut enter_root = |depth: usize| -> Result<()> {
        if depth == 0 {
            if seen_root {
                return Err(Error::Parse("more than one root element".to_string()));
            }
            seen_root = true;
        }
        Ok(())
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                enter_root(depth)?;
                depth += 1;
                if e.name().as_ref() == b"text" {
                    let (start, duration) = cue_timing(e);
                    current = Some((start, duration, String::new()));
                }
            }
            Ok(Event::Empty(ref e)) => {
                enter_root(depth)?;
                if e.name().as_ref() == b"text" {
                    let (start, duration) = cue_timing(e);
                    cues.push(finish_cue(start, duration, ""));
                }
            }
            Ok(Event::Text(ref e)) => {
                if depth == 0 && !e.iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::Parse("text outside the root element".to_string()));
                }
                if let Some((_, _, ref mut text)) = current {
                    let chunk = e.unescape().map_err(|err| Error::Parse(err.to_string()))?;
                    text.push_str(&chunk);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some((_, _, ref mut text)) = current {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == b"text" {
                    if let Some((start, duration, text)) = current.take() {
                        cues.push(finish_cue(start, duration, &text));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(e.to_string())),
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::Parse(format!("document ends with {depth} unclosed element(s)")));
    }
    if !seen_root {
        return Err(Error::Parse("no root element".to_string()));
    }

    Ok(cues)
}

/// Like [`parse_caption_xml`], but a broken document yields no cues instead of an error
pub fn parse_cues(xml: &str) -> Vec<SubtitleCue> {
    parse_caption_xml(xml).unwrap_or_else(|e| {
        warn!("Dropping subtitles: {e}");
        Vec::new()
    })
}

/// Run the whole pipeline for one video: page, metadata, captions
pub async fn fetch_video<T: Transport>(fetcher: &Fetcher<T>, id: &VideoId, lang: &str) -> Result<VideoRecord> {
    let page_url = format!("https://www.youtube.com/watch?v={id}");
    debug!("Fetching watch page: {page_url}");
    let page_html = fetcher.fetch(&page_url).await?;

    let metadata = extract_metadata(&page_html).map_err(|e| match e {
        Error::Extraction(reason) => Error::Extraction(format!("video {id}: {reason}")),
        other => other,
    })?;

    let cues = match select_caption_url(&page_html, lang) {
        Some(url) => match fetcher.fetch(&url).await {
            Ok(xml) => parse_cues(&xml),
            Err(Error::HttpStatus { status, .. }) => {
                warn!("Dropping subtitles for video {id}: caption track answered HTTP {status}");
                Vec::new()
            }
            Err(e) => return Err(e),
        },
        None => {
            debug!("No captions for video {id}");
            Vec::new()
        }
    };

    Ok(VideoRecord {
        id: id.clone(),
        metadata,
        cues,
    })
}
