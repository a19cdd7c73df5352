// tests/mission_pipeline.rs
use std::sync::Arc;

use yt_subtitle_mission::config::mission::{ChannelSpec, MissionConfig, PacingConfig};
use yt_subtitle_mission::downloader::MockDownloader;
use yt_subtitle_mission::hints::HintCache;
use yt_subtitle_mission::llm::MockClient;
use yt_subtitle_mission::model::{parse_date, SectionKind};
use yt_subtitle_mission::{CandidateItem, Language, Manifest, MissionControl, Report, Status};

const RAW: &str = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nsubtitle line\n";

fn item(id: &str, title: &str, date: &str) -> CandidateItem {
    CandidateItem::new(id, title, parse_date(date).ok())
}

fn config(out: &std::path::Path) -> MissionConfig {
    MissionConfig {
        output_dir: out.to_path_buf(),
        pacing: PacingConfig { delay_secs: 0 },
        channels: vec![ChannelSpec {
            name: "Canal".into(),
            url: "https://www.youtube.com/@canal".into(),
            cutoff: parse_date("20250601").unwrap(),
            until: None,
            sections: vec![SectionKind::Videos, SectionKind::Streams],
            playlists: vec!["https://www.youtube.com/playlist?list=PL1".into()],
        }],
        ..MissionConfig::default()
    }
}

fn downloader() -> MockDownloader {
    MockDownloader::new()
        .with_listing(
            "https://www.youtube.com/@canal/videos",
            vec![
                item("vidaaaaaaaa", "¿Qué pasa con la economía?", "20250810"),
                item("vidbbbbbbbb", "Bitcoin 2025", "20250715"),
                item("vidcccccccc", "Old news", "20250530"),
                item("viddddddddd", "Older news", "20250410"),
            ],
        )
        .with_listing(
            "https://www.youtube.com/playlist?list=PL1",
            vec![item("vidaaaaaaaa", "¿Qué pasa con la economía?", "20250810")],
        )
        .with_subtitle("vidaaaaaaaa", Language::Es, RAW)
        .with_subtitle("vidbbbbbbbb", Language::En, RAW)
}

#[tokio::test]
async fn end_to_end_with_listing_failure_and_hints() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir.path().join("subs"));
    let manifest = Manifest::from_channels(&cfg.channels).unwrap();
    assert_eq!(manifest.targets.len(), 3);

    let llm = Arc::new(MockClient::new(Some("vidbbbbbbbb,en")));
    let control = MissionControl::new(cfg, Box::new(downloader()), llm.clone())
        .with_hint_cache(Some(HintCache::new(dir.path().join("hints"))));

    // /streams has no canned listing: that target fails and is skipped
    let outcomes = control.run(&manifest).await.unwrap();
    assert_eq!(outcomes.len(), 2, "old items excluded, duplicate merged");

    let first = &outcomes[0];
    assert_eq!(first.mission.id, "vidaaaaaaaa");
    assert_eq!(first.mission.language, Language::Es);
    assert_eq!(first.status, Status::Extracted);

    let second = &outcomes[1];
    assert_eq!(second.mission.language, Language::En);
    assert_eq!(second.status, Status::Extracted);

    // only the undecidable title went to the model
    let prompts = llm.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Bitcoin 2025"));
    assert!(!prompts[0].contains("economía"));

    let report = Report::from_outcomes(&outcomes);
    assert_eq!((report.total, report.succeeded(), report.failed), (2, 2, 0));
}

#[tokio::test]
async fn rerun_reports_existing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir.path().join("subs"));
    let manifest = Manifest::from_channels(&cfg.channels).unwrap();

    let first = MissionControl::new(cfg.clone(), Box::new(downloader()), Arc::new(MockClient::new(None)));
    let run1 = first.run(&manifest).await.unwrap();
    assert!(run1.iter().all(|o| o.status == Status::Extracted));

    let second = MissionControl::new(cfg, Box::new(downloader()), Arc::new(MockClient::new(None)));
    let run2 = second.run(&manifest).await.unwrap();
    assert_eq!(run2.len(), run1.len());
    assert!(run2.iter().all(|o| o.status == Status::AlreadyPresent));
    for (a, b) in run1.iter().zip(&run2) {
        assert_eq!(a.artifact, b.artifact);
    }
}

#[tokio::test]
async fn nothing_queued_means_no_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir.path().join("subs"));
    cfg.channels[0].cutoff = parse_date("20260101").unwrap();
    let manifest = Manifest::from_channels(&cfg.channels).unwrap();

    let control = MissionControl::new(cfg, Box::new(downloader()), Arc::new(MockClient::new(None)));
    let outcomes = control.run(&manifest).await.unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(Report::from_outcomes(&outcomes).total, 0);
}

#[tokio::test]
async fn url_list_missions_share_the_worker_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir.path().join("subs"));
    cfg.channels.clear();
    let a = "https://www.youtube.com/watch?v=urlaaaaaaaa";
    let b = "https://www.youtube.com/watch?v=urlbbbbbbbb";
    let manifest = Manifest::from_urls("favoritos", &[a.to_string(), b.to_string()]);

    let dl = MockDownloader::new()
        .with_listing(a, vec![item("urlaaaaaaaa", "Entrevista sobre la inflación", "20190301")])
        .with_listing(b, vec![item("urlbbbbbbbb", "Interview about the markets", "20120615")])
        .with_subtitle("urlaaaaaaaa", Language::Es, RAW)
        .with_subtitle("urlbbbbbbbb", Language::En, RAW);
    let control = MissionControl::new(cfg, Box::new(dl), Arc::new(MockClient::new(None)));

    let outcomes = control.run(&manifest).await.unwrap();
    assert_eq!(outcomes.len(), 2, "old uploads are not cut off");
    assert!(outcomes.iter().all(|o| o.status == Status::Extracted));
    assert!(outcomes.iter().all(|o| o.mission.channel == "favoritos"));

    let report = Report::from_outcomes(&outcomes);
    assert_eq!(report.extracted, 2);
    assert_eq!(report.failed, 0);
}
