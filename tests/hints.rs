// tests/hints.rs
use yt_subtitle_mission::hints::{build_prompt, collect_hints, HintCache, SEPARATOR};
use yt_subtitle_mission::llm::{DisabledClient, MockClient};
use yt_subtitle_mission::model::parse_date;
use yt_subtitle_mission::{Language, Mission};

fn mission(id: &str, title: &str) -> Mission {
    Mission {
        id: id.into(),
        title: title.into(),
        upload_date: parse_date("20250810").unwrap(),
        channel: "Canal".into(),
        language: Language::Es,
    }
}

#[test]
fn prompt_lists_one_title_per_line() {
    let a = mission("aaaaaaaaaaa", "Bitcoin 2025");
    let b = mission("bbbbbbbbbbb", "NVIDIA Q2");
    let prompt = build_prompt(&[&a, &b]);
    assert!(prompt.contains(&format!("aaaaaaaaaaa{SEPARATOR}Bitcoin 2025")));
    assert!(prompt.contains(&format!("bbbbbbbbbbb{SEPARATOR}NVIDIA Q2")));
}

#[tokio::test]
async fn reply_rows_become_hints_and_are_cached() {
    let dir = tempfile::tempdir().unwrap();
    let cache = HintCache::new(dir.path());
    let a = mission("aaaaaaaaaaa", "Bitcoin 2025");
    let b = mission("bbbbbbbbbbb", "NVIDIA Q2");

    let client = MockClient::new(Some("aaaaaaaaaaa,en\nbbbbbbbbbbb,fr\n"));
    let hints = collect_hints(&client, Some(&cache), &[&a, &b]).await;
    assert_eq!(hints.len(), 1);
    assert_eq!(hints["aaaaaaaaaaa"], Language::En);
    assert_eq!(cache.get("Bitcoin 2025"), Some(Language::En));
    assert_eq!(cache.get("NVIDIA Q2"), None);

    // rerun: cached title is not asked again
    let again = MockClient::new(Some("bbbbbbbbbbb,es\n"));
    let hints = collect_hints(&again, Some(&cache), &[&a, &b]).await;
    assert_eq!(hints["aaaaaaaaaaa"], Language::En);
    assert_eq!(hints["bbbbbbbbbbb"], Language::Es);
    let prompts = again.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("Bitcoin 2025"));
}

#[tokio::test]
async fn no_reply_means_no_hints() {
    let a = mission("aaaaaaaaaaa", "Bitcoin 2025");
    assert!(collect_hints(&DisabledClient, None, &[&a]).await.is_empty());

    let silent = MockClient::new(None);
    assert!(collect_hints(&silent, None, &[&a]).await.is_empty());
    assert_eq!(silent.prompts.lock().unwrap().len(), 1);
}
