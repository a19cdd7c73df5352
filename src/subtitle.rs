// src/subtitle.rs
//! WebVTT → cleaned plain text.
//!
//! The raw file is read into line records, non-text records are dropped,
//! text is normalized, and consecutive repeats (rolling auto-captions repeat
//! each line across two cues) are collapsed. Output lines are `- <text>`.

use once_cell::sync::OnceCell;
use regex::Regex;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("missing WEBVTT header")]
    MissingHeader,
    #[error("no caption text found")]
    NoText,
}

/// One raw line, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueLine<'a> {
    Header,
    /// Header fields (`Kind:`, `Language:`) and NOTE/STYLE/REGION blocks.
    Metadata,
    /// Optional identifier line right before a timing line.
    CueId,
    Timing,
    Blank,
    Text(&'a str),
}

/// NOTE may open a block anywhere; STYLE and REGION only before the first cue.
fn is_block_start(t: &str, seen_cue: bool) -> bool {
    let kws: &[&str] = if seen_cue {
        &["NOTE"]
    } else {
        &["NOTE", "STYLE", "REGION"]
    };
    kws.iter()
        .any(|kw| t == *kw || t.starts_with(&format!("{kw} ")) || t.starts_with(&format!("{kw}\t")))
}

/// Classify every line of a raw subtitle file.
///
/// Blocks and cue ids are only recognized right after a blank line, header
/// fields only between `WEBVTT` and the first blank line. Inside a cue every
/// line is text.
pub fn parse_lines(raw: &str) -> Vec<CueLine<'_>> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let lines: Vec<&str> = raw.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut seen_header = false;
    let mut in_header = false;
    let mut in_block = false;
    let mut seen_cue = false;
    let mut after_blank = true;

    for (i, line) in lines.iter().enumerate() {
        let t = line.trim();

        if t.is_empty() {
            in_block = false;
            in_header = false;
            after_blank = true;
            out.push(CueLine::Blank);
            continue;
        }
        let at_block_start = std::mem::replace(&mut after_blank, false);

        if in_block {
            out.push(CueLine::Metadata);
            continue;
        }
        if !seen_header && t.starts_with("WEBVTT") {
            seen_header = true;
            in_header = true;
            out.push(CueLine::Header);
            continue;
        }
        if in_header {
            out.push(CueLine::Metadata);
            continue;
        }
        if t.contains("-->") {
            seen_cue = true;
            out.push(CueLine::Timing);
            continue;
        }
        if at_block_start && is_block_start(t, seen_cue) {
            in_block = true;
            out.push(CueLine::Metadata);
            continue;
        }
        let next_is_timing = lines.get(i + 1).is_some_and(|n| n.contains("-->"));
        if at_block_start && next_is_timing {
            out.push(CueLine::CueId);
            continue;
        }
        out.push(CueLine::Text(line));
    }
    out
}

/// Strip tags and speaker markers, decode entities, collapse whitespace.
pub fn normalize_caption(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    let mut out = re_tags.replace_all(s, "").to_string();

    out = out.replace("&gt;&gt;", "");
    out = html_escape::decode_html_entities(&out).to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Clean a raw WebVTT document into `- <text>` lines.
pub fn clean_vtt(raw: &str) -> Result<String, SubtitleError> {
    let records = parse_lines(raw);
    if records.iter().find(|r| !matches!(r, CueLine::Blank)) != Some(&CueLine::Header) {
        return Err(SubtitleError::MissingHeader);
    }

    let mut out = String::new();
    let mut last: Option<String> = None;
    for rec in records {
        let CueLine::Text(t) = rec else { continue };
        let line = normalize_caption(t);
        if line.is_empty() || last.as_deref() == Some(line.as_str()) {
            continue;
        }
        out.push_str("- ");
        out.push_str(&line);
        out.push('\n');
        last = Some(line);
    }

    if out.is_empty() {
        return Err(SubtitleError::NoText);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_block_is_metadata() {
        let raw = "WEBVTT\nKind: captions\nLanguage: es\n\n00:00:00.000 --> 00:00:01.000\nhola\n";
        let recs = parse_lines(raw);
        assert_eq!(
            recs,
            vec![
                CueLine::Header,
                CueLine::Metadata,
                CueLine::Metadata,
                CueLine::Blank,
                CueLine::Timing,
                CueLine::Text("hola"),
            ]
        );
    }

    #[test]
    fn note_and_style_blocks_are_skipped() {
        let raw = "WEBVTT\n\nNOTE this is\na comment\n\nSTYLE\n::cue { color: red }\n\n1\n00:00:00.000 --> 00:00:01.000\ntexto\n";
        assert_eq!(clean_vtt(raw).unwrap(), "- texto\n");
    }

    #[test]
    fn inline_timestamps_and_tags_are_removed() {
        let s = "hola<00:00:01.120><c> que</c><00:00:01.360><c> tal</c>";
        assert_eq!(normalize_caption(s), "hola que tal");
        assert_eq!(normalize_caption("&gt;&gt; Buenos   días &amp; bienvenidos"), "Buenos días & bienvenidos");
    }

    #[test]
    fn bom_before_header_is_tolerated() {
        let raw = "\u{feff}WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nok\n";
        assert_eq!(clean_vtt(raw).unwrap(), "- ok\n");
    }
}
