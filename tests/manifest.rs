// tests/manifest.rs
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::fs;

use yt_subtitle_mission::manifest::{
    interactive_channels, read_channel_list, read_url_list, Prompter, URL_LIST_CUTOFF,
};
use yt_subtitle_mission::model::{parse_date, SectionKind};
use yt_subtitle_mission::Manifest;

const CHANNELS: &str = "\
Channel Name, Handle / URL, Playlist URL 1, Playlist URL 2, Playlist URL 3, Playlist URL 4
'Canal, Uno', https://www.youtube.com/@canaluno/, https://www.youtube.com/playlist?list=PLa, , https://www.youtube.com/playlist?list=PLc, https://www.youtube.com/playlist?list=PLd
, https://www.youtube.com/@sinnombre
Canal Dos, https://www.youtube.com/@canaldos;extra
";

enum Answer {
    Yes,
    No,
    Date(&'static str),
    Default,
}

/// Replays canned answers; a malformed date is rejected and the next answer used,
/// the way the terminal prompter re-asks.
struct Scripted {
    answers: VecDeque<Answer>,
    prompts: Vec<String>,
}

impl Scripted {
    fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
            prompts: Vec::new(),
        }
    }
}

impl Prompter for Scripted {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(Answer::Yes) => Ok(true),
            Some(Answer::No) => Ok(false),
            Some(Answer::Default) => Ok(default),
            _ => Err(anyhow!("unexpected confirm: {prompt}")),
        }
    }

    fn date(&mut self, prompt: &str, default: Option<NaiveDate>) -> Result<NaiveDate> {
        self.prompts.push(prompt.to_string());
        loop {
            match self.answers.pop_front() {
                Some(Answer::Date(raw)) => match parse_date(raw) {
                    Ok(d) => return Ok(d),
                    Err(_) => continue,
                },
                Some(Answer::Default) => {
                    return default.ok_or_else(|| anyhow!("no default for {prompt}"))
                }
                _ => return Err(anyhow!("unexpected date prompt: {prompt}")),
            }
        }
    }
}

fn today() -> NaiveDate {
    parse_date("20250901").unwrap()
}

#[test]
fn channel_list_reads_quoted_names_and_three_playlists() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("youtube_channel_list.csv");
    fs::write(&p, CHANNELS).unwrap();

    let rows = read_channel_list(&p).unwrap();
    assert_eq!(rows.len(), 2, "row without a name is skipped");
    assert_eq!(rows[0].name, "Canal, Uno");
    assert_eq!(
        rows[0].playlists,
        [
            "https://www.youtube.com/playlist?list=PLa",
            "https://www.youtube.com/playlist?list=PLc"
        ]
    );
    assert!(rows[1].playlists.is_empty());
}

#[test]
fn channel_list_without_required_columns_fails() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bad.csv");
    fs::write(&p, "Name,URL\nx,y\n").unwrap();
    assert!(read_channel_list(&p).is_err());
}

#[test]
fn interactive_session_builds_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("youtube_channel_list.csv");
    fs::write(&p, CHANNELS).unwrap();
    let rows = read_channel_list(&p).unwrap();

    let mut prompter = Scripted::new(vec![
        // Canal, Uno
        Answer::Yes,
        Answer::Date("2025-06-01"), // malformed, asked again
        Answer::Date("20250601"),
        Answer::Date("20250501"), // before cutoff, asked again
        Answer::Default,
        Answer::Yes,  // videos
        Answer::No,   // streams
        Answer::Default, // PLa
        Answer::No,   // PLc
        // Canal Dos
        Answer::No,
    ]);
    let channels = interactive_channels(&rows, &mut prompter, today()).unwrap();
    assert!(prompter.answers.is_empty());
    assert!(prompter.prompts.iter().any(|p| p == "Scan /@canaluno/videos?"));
    assert!(prompter.prompts.iter().any(|p| p == "Scan playlist 'PLa'?"));

    assert_eq!(channels.len(), 1);
    let ch = &channels[0];
    assert_eq!(ch.cutoff, parse_date("20250601").unwrap());
    assert_eq!(ch.until, Some(today()));
    assert_eq!(ch.sections, [SectionKind::Videos]);

    let manifest = Manifest::from_channels(&channels).unwrap();
    let urls: Vec<_> = manifest.targets.iter().map(|t| t.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://www.youtube.com/@canaluno/videos",
            "https://www.youtube.com/playlist?list=PLa"
        ]
    );
    assert!(manifest.targets.iter().all(|t| t.until == Some(today())));
}

#[test]
fn channel_with_nothing_selected_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("youtube_channel_list.csv");
    fs::write(&p, CHANNELS).unwrap();
    let rows = read_channel_list(&p).unwrap();

    let mut prompter = Scripted::new(vec![
        Answer::No,
        Answer::Yes,
        Answer::Date("20250101"),
        Answer::Default,
        Answer::No,
        Answer::No,
    ]);
    let channels = interactive_channels(&rows, &mut prompter, today()).unwrap();
    assert!(channels.is_empty());
    assert!(Manifest::from_channels(&channels).unwrap().is_empty());
}

const BOOKMARKS_JSON: &str = r#"{
  "roots": {
    "bookmark_bar": {
      "type": "folder",
      "children": [
        {"type": "url", "name": "Uno", "url": "https://www.youtube.com/watch?v=aaaaaaaaaaa"},
        {"type": "folder", "name": "Charlas", "children": [
          {"type": "url", "url": "https://www.youtube.com/watch?v=bbbbbbbbbbb&t=42"},
          {"type": "url", "url": "https://example.com/watch?v=nope"}
        ]},
        {"type": "folder", "url": "https://www.youtube.com/watch?v=notalink000"}
      ]
    }
  }
}"#;

#[test]
fn bookmarks_json_yields_nested_watch_urls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookmarks.json");
    fs::write(&path, BOOKMARKS_JSON).unwrap();
    assert_eq!(
        read_url_list(&path).unwrap(),
        [
            "https://www.youtube.com/watch?v=aaaaaaaaaaa",
            "https://www.youtube.com/watch?v=bbbbbbbbbbb&t=42",
        ]
    );
}

#[test]
fn bookmarks_html_and_text_lists() {
    let dir = tempfile::tempdir().unwrap();
    let html = dir.path().join("bookmarks.html");
    fs::write(
        &html,
        r#"<DL><p><DT><A HREF="https://www.youtube.com/watch?v=ccccccccccc" ADD_DATE="1">C</A>
<DT><a href='https://www.youtube.com/@canal'>canal</a>
<DT><A HREF="https://www.youtube.com/watch?v=ddddddddddd">D</A></DL>"#,
    )
    .unwrap();
    assert_eq!(
        read_url_list(&html).unwrap(),
        [
            "https://www.youtube.com/watch?v=ccccccccccc",
            "https://www.youtube.com/watch?v=ddddddddddd",
        ]
    );

    let txt = dir.path().join("urls.txt");
    fs::write(
        &txt,
        "  https://www.youtube.com/watch?v=eeeeeeeeeee  \n\n# notes\nhttps://youtu.be/short\n",
    )
    .unwrap();
    assert_eq!(
        read_url_list(&txt).unwrap(),
        ["https://www.youtube.com/watch?v=eeeeeeeeeee"]
    );
}

#[test]
fn malformed_bookmarks_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookmarks.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(read_url_list(&path).is_err());
}

#[test]
fn url_targets_admit_any_date() {
    let urls = vec![
        "https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string(),
        " https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string(),
        "https://www.youtube.com/watch?v=bbbbbbbbbbb".to_string(),
    ];
    let m = Manifest::from_urls("favoritos", &urls);
    assert_eq!(m.targets.len(), 2);
    for t in &m.targets {
        assert_eq!(t.section, SectionKind::Video);
        assert_eq!(t.channel, "favoritos");
        assert_eq!(t.cutoff, URL_LIST_CUTOFF);
        assert!(t.admits(parse_date("20060101").unwrap()));
        assert!(t.until.is_none());
    }
    assert!(Manifest::from_urls("vacío", &[]).is_empty());
}
