// tests/artifact_maintenance.rs
use std::fs;

use yt_subtitle_mission::artifact::{ArtifactStore, QUARANTINE_DIR};

fn seed(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("[aaaaaaaaaaa].(20250810).Uno.es.cleaned.vtt"), "- uno\n").unwrap();
    fs::write(dir.join("[bbbbbbbbbbb].(20250715).Dos.en.cleaned.vtt"), "- dos\n").unwrap();
    fs::write(dir.join("nested/[bbbbbbbbbbb].(20250715).Dos_copy.en.cleaned.vtt"), "- dos\n").unwrap();
    fs::write(dir.join("notes.vtt"), "- uno\n").unwrap();
}

#[test]
fn archive_is_rebuilt_from_artifact_names() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let archive = dir.path().join("ytdl-archive.txt");
    fs::write(&archive, "youtube stale000000\n").unwrap();

    let n = ArtifactStore::new(dir.path()).rebuild_archive(&archive).unwrap();
    assert_eq!(n, 2);
    assert_eq!(
        fs::read_to_string(&archive).unwrap(),
        "youtube aaaaaaaaaaa\nyoutube bbbbbbbbbbb\n"
    );
}

#[test]
fn dry_run_moves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let report = ArtifactStore::new(dir.path()).dedupe(true).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.duplicate_groups, 2);
    assert_eq!(report.moved.len(), 2);
    assert!(!dir.path().join(QUARANTINE_DIR).exists());
}

#[test]
fn duplicates_are_quarantined_with_unique_names() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let quarantine = dir.path().join(QUARANTINE_DIR);
    fs::create_dir_all(&quarantine).unwrap();
    fs::write(quarantine.join("notes.vtt"), "earlier").unwrap();

    let store = ArtifactStore::new(dir.path());
    let report = store.dedupe(false).unwrap();
    assert_eq!(report.moved.len(), 2);
    for (from, to) in &report.moved {
        assert!(!from.exists());
        assert!(to.exists());
    }
    assert!(quarantine.join("notes_1.vtt").exists());
    assert_eq!(fs::read_to_string(quarantine.join("notes.vtt")).unwrap(), "earlier");

    // quarantine is not rescanned
    assert_eq!(store.dedupe(false).unwrap().duplicate_groups, 0);
}
