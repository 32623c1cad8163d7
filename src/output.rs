use crate::VideoRecord;

/// Line placed between the documents of consecutive videos
pub const SEPARATOR: &str = "---";

/// Render a single video as Markdown
pub fn render(record: &VideoRecord) -> String {
    let meta = &record.metadata;
    let mut blocks = vec![format!("# {}", meta.title), record.id.watch_url()];

    let mut metadata = vec![
        "## Metadata".to_string(),
        String::new(),
        format!("- **Views:** {}", group_thousands(meta.views)),
        format!("- **Published:** {}", meta.published),
        format!("- **Duration:** {}", format_duration(meta.duration_secs)),
    ];
    if !meta.tags.is_empty() {
        metadata.push(format!("- **Tags:** {}", meta.tags.join(", ")));
    }
    blocks.push(metadata.join("\n"));

    if !meta.description.is_empty() {
        blocks.push(format!("## Description\n\n{}", meta.description));
    }

    if !record.cues.is_empty() {
        let lines = record
            .cues
            .iter()
            .map(|cue| {
                let secs = cue.start as u64;
                format!(
                    "**[{:02}:{:02}]({})** {}",
                    secs / 60,
                    secs % 60,
                    record.id.short_url(secs),
                    cue.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(format!("## Subtitles\n\n{lines}"));
    }

    blocks.join("\n\n")
}

/// Render several videos, in the given order
pub fn render_all(records: &[VideoRecord]) -> String {
    records
        .iter()
        .map(render)
        .collect::<Vec<_>>()
        .join(format!("\n\n{SEPARATOR}\n\n").as_str())
}

/// "1 hour 1 minute", "2 hours", "0 minutes"; leftover seconds are dropped
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = seconds % 3600 / 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours} hour{}", if hours > 1 { "s" } else { "" }));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} minute{}", if minutes > 1 { "s" } else { "" }));
    }

    if parts.is_empty() {
        "0 minutes".to_string()
    } else {
        parts.join(" ")
    }
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SubtitleCue, VideoId, VideoMetadata};

    fn sample_record() -> VideoRecord {
        VideoRecord {
            id: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            metadata: VideoMetadata {
                title: "Test Video".to_string(),
                description: "A description.".to_string(),
                views: 1_234_567,
                published: "24 October 2009, 23:57".to_string(),
                tags: vec!["music".to_string(), "80s".to_string()],
                duration_secs: 3661,
            },
            cues: vec![
                SubtitleCue {
                    start: 0.5,
                    duration: 1.5,
                    text: "Hello world".to_string(),
                },
                SubtitleCue {
                    start: 83.9,
                    duration: 2.0,
                    text: "This is a test".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_render_full() {
        let expected = "\
# Test Video

https://youtube.com/watch?v=dQw4w9WgXcQ

## Metadata

- **Views:** 1,234,567
- **Published:** 24 October 2009, 23:57
- **Duration:** 1 hour 1 minute
- **Tags:** music, 80s

## Description

A description.

## Subtitles

**[00:00](https://youtu.be/dQw4w9WgXcQ?t=0)** Hello world
**[01:23](https://youtu.be/dQw4w9WgXcQ?t=83)** This is a test";
        assert_eq!(render(&sample_record()), expected);
    }

    #[test]
    fn test_render_omits_empty_sections() {
        let mut record = sample_record();
        record.metadata.tags.clear();
        record.metadata.description.clear();
        record.cues.clear();

        let md = render(&record);
        assert!(md.ends_with("- **Duration:** 1 hour 1 minute"));
        assert!(!md.contains("Tags"));
        assert!(!md.contains("## Description"));
        assert!(!md.contains("## Subtitles"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = sample_record();
        assert_eq!(render(&record), render(&record.clone()));
    }

    #[test]
    fn test_render_long_timestamps() {
        let mut record = sample_record();
        record.cues = vec![SubtitleCue {
            start: 6005.0,
            duration: 0.0,
            text: "late".to_string(),
        }];
        assert!(render(&record).ends_with("**[100:05](https://youtu.be/dQw4w9WgXcQ?t=6005)** late"));
    }

    #[test]
    fn test_render_all_keeps_order() {
        let first = sample_record();
        let mut second = sample_record();
        second.metadata.title = "Second".to_string();

        let md = render_all(&[first.clone(), second.clone()]);
        assert_eq!(md, format!("{}\n\n---\n\n{}", render(&first), render(&second)));
        assert!(md.find("# Test Video").unwrap() < md.find("# Second").unwrap());
        assert_eq!(render_all(&[]), "");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 minutes");
        assert_eq!(format_duration(30), "0 minutes");
        assert_eq!(format_duration(90), "1 minute");
        assert_eq!(format_duration(150), "2 minutes");
        assert_eq!(format_duration(3600), "1 hour");
        assert_eq!(format_duration(3661), "1 hour 1 minute");
        assert_eq!(format_duration(7200), "2 hours");
        assert_eq!(format_duration(9000), "2 hours 30 minutes");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }
}
