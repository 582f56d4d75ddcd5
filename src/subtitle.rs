use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SubtransError};

/// One cue of an SRT file.
///
/// Timing strings are carried verbatim; only `text` is ever rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleItem {
    pub index: usize,
    pub start_time: String,
    pub end_time: String,
    pub text: String,
}

impl SubtitleItem {
    pub fn new(index: usize, start_time: &str, end_time: &str, text: &str) -> Self {
        Self {
            index,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            text: text.to_string(),
        }
    }
}

/// Read and parse an SRT file
pub async fn read_subtitles<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleItem>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SubtransError::FileNotFound(path.display().to_string()));
    }

    let bytes = fs::read(path).await?;
    let content = String::from_utf8(bytes).map_err(|e| {
        SubtransError::Subtitle(format!(
            "{}: not valid UTF-8 (first invalid byte at offset {})",
            path.display(),
            e.utf8_error().valid_up_to()
        ))
    })?;
    let items = parse_srt(&content).map_err(|e| match e {
        SubtransError::Subtitle(detail) => SubtransError::Subtitle(format!("{}: {}", path.display(), detail)),
        other => other,
    })?;

    debug!("Read {} subtitle items from {}", items.len(), path.display());
    Ok(items)
}

/// Write subtitle items as UTF-8 SRT
pub async fn write_subtitles<P: AsRef<Path>>(path: P, items: &[SubtitleItem]) -> Result<()> {
    let path = path.as_ref();
    info!("Writing SRT file: {}", path.display());
    fs::write(path, render_srt(items)).await?;
    Ok(())
}

pub fn parse_srt(content: &str) -> Result<Vec<SubtitleItem>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

    let mut items = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in normalized.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                items.push(parse_block(&block, items.len() + 1)?);
                block.clear();
            }
        } else {
            block.push(line);
        }
    }

    Ok(items)
}

fn parse_block(lines: &[&str], position: usize) -> Result<SubtitleItem> {
    let index = lines[0].trim().parse::<usize>().map_err(|_| {
        SubtransError::Subtitle(format!(
            "cue #{}: expected a numeric index, found '{}'",
            position, lines[0]
        ))
    })?;

    let timing = lines.get(1).ok_or_else(|| {
        SubtransError::Subtitle(format!("cue #{}: missing timing line", position))
    })?;
    let (start_time, end_time) = timing.split_once("-->").ok_or_else(|| {
        SubtransError::Subtitle(format!(
            "cue #{}: expected 'start --> end', found '{}'",
            position, timing
        ))
    })?;

    Ok(SubtitleItem {
        index,
        start_time: start_time.trim().to_string(),
        end_time: end_time.trim().to_string(),
        text: lines[2..].join("\n"),
    })
}

pub fn render_srt(items: &[SubtitleItem]) -> String {
    let mut srt_content = String::new();

    for item in items {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            item.index, item.start_time, item.end_time, item.text
        ));
    }

    srt_content
}
