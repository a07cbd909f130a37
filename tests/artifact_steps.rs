// tests/artifact_steps.rs

//! Workspace, validation, naming and content-type steps in isolation.

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tempfile::TempDir;

use cronbackup::pipeline::content_type::{sniff, OCTET_STREAM, SNIFF_LEN, TEXT_PLAIN_UTF8};
use cronbackup::pipeline::workspace::sanitize_component;
use cronbackup::pipeline::{
    artifact_name, detect_content_type, generate_run_id, validate_artifact, RunId, Workspace,
};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn artifact_name_embeds_timestamp_task_id_and_extension() {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let name = artifact_name("db", &RunId::from("abcd1234"), Path::new("/tmp/x/dump.sql"), at);
    assert_eq!(name, "20240102030405-db-abcd1234.sql");
}

#[test]
fn artifact_name_timestamp_is_fourteen_digits() {
    let name = artifact_name(
        "db",
        &RunId::from("abcd1234"),
        Path::new("/tmp/x/dump.sql"),
        Utc::now(),
    );
    let (stamp, rest) = name.split_once('-').unwrap();
    assert!(stamp.len() >= 14);
    assert!(stamp.bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(rest, "db-abcd1234.sql");
}

#[test]
fn artifact_name_without_extension_and_with_double_extension() {
    let at = Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap();
    let id = RunId::from("zz00zz00");

    assert_eq!(
        artifact_name("files", &id, Path::new("/data/archive"), at),
        "20301231235959-files-zz00zz00"
    );
    assert_eq!(
        artifact_name("files", &id, Path::new("/data/archive.tar.gz"), at),
        "20301231235959-files-zz00zz00.gz"
    );
}

proptest! {
    // Object names stay unique per run even when everything else collides.
    #[test]
    fn names_from_distinct_ids_differ(task in "[a-z][a-z0-9-]{0,15}", secs in 0i64..4_000_000_000) {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        let src = Path::new("/tmp/x/dump.sql.gz");
        let a = artifact_name(&task, &generate_run_id(), src, at);
        let b = artifact_name(&task, &generate_run_id(), src, at);

        prop_assert!(a.ends_with(".gz"));
        prop_assert!(a[..14].bytes().all(|c| c.is_ascii_digit()));
        let needle = format!("-{task}-");
        prop_assert!(a.contains(&needle));
        // 36^8 ids: a clash here would be a generator bug.
        prop_assert_ne!(a, b);
    }
}

#[test]
fn same_second_different_ids_give_different_names() {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let a = artifact_name("db", &RunId::from("aaaaaaaa"), Path::new("d.sql"), at);
    let b = artifact_name("db", &RunId::from("bbbbbbbb"), Path::new("d.sql"), at);
    assert_ne!(a, b);
}

#[tokio::test]
async fn validation_is_about_existence_only() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    let empty = dir.path().join("empty.bin");
    std::fs::write(&empty, b"")?;
    validate_artifact(&empty).await?;

    validate_artifact(dir.path()).await?;

    let missing = dir.path().join("missing.sql");
    let err = validate_artifact(&missing).await.unwrap_err();
    assert_eq!(err.path, missing);
    assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);

    Ok(())
}

#[test]
fn workspace_is_named_after_task_and_run_and_removed_on_drop() -> TestResult {
    let root = TempDir::new()?;
    let id = RunId::from("abcd1234");

    let ws = Workspace::provision(root.path(), "db", &id)?;
    let path = ws.path().to_path_buf();
    assert!(path.is_dir());
    assert_eq!(path.parent(), Some(root.path()));
    let dir_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(dir_name.starts_with("backup-db-abcd1234-"), "{dir_name}");
    assert!(dir_name.len() > "backup-db-abcd1234-".len());

    drop(ws);
    assert!(!path.exists());
    Ok(())
}

#[test]
fn two_workspaces_for_the_same_run_id_are_distinct() -> TestResult {
    let root = TempDir::new()?;
    let id = RunId::from("abcd1234");

    let a = Workspace::provision(root.path(), "db", &id)?;
    let b = Workspace::provision(root.path(), "db", &id)?;
    assert_ne!(a.path(), b.path());
    Ok(())
}

#[test]
fn retained_workspace_survives() -> TestResult {
    let root = TempDir::new()?;
    let ws = Workspace::provision(root.path(), "db", &RunId::from("keep0000"))?;
    std::fs::write(ws.path().join("dump.sql"), b"select 1;")?;

    let kept = ws.retain();
    assert!(kept.join("dump.sql").is_file());
    Ok(())
}

#[test]
fn workspace_provisioning_fails_under_missing_root() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("does/not/exist");

    let err = Workspace::provision(&missing, "db", &RunId::from("abcd1234")).unwrap_err();
    assert_eq!(err.root, missing);
}

#[test]
fn task_names_are_sanitized_for_directory_names() {
    assert_eq!(sanitize_component("nightly-db_1"), "nightly-db_1");
    assert_eq!(sanitize_component("my job/../x"), "my_job____x");
}

#[tokio::test]
async fn text_files_are_plain_utf8() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("dump.sql");
    std::fs::write(&path, "-- dump\nCREATE TABLE t (id int);\n")?;

    assert_eq!(detect_content_type(&path).await?, TEXT_PLAIN_UTF8);
    Ok(())
}

#[tokio::test]
async fn content_type_ignores_the_extension() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("looks-like.txt");
    std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D])?;

    assert_eq!(detect_content_type(&path).await?, "image/png");
    Ok(())
}

#[tokio::test]
async fn detection_fails_for_missing_files_and_directories() -> TestResult {
    let dir = TempDir::new()?;

    let missing = dir.path().join("nope");
    let err = detect_content_type(&missing).await.unwrap_err();
    assert_eq!(err.path, missing);

    assert!(detect_content_type(dir.path()).await.is_err());
    Ok(())
}

#[test]
fn sniff_classifies_buffers() {
    assert_eq!(sniff(b""), TEXT_PLAIN_UTF8);
    assert_eq!(sniff("héllo wörld".as_bytes()), TEXT_PLAIN_UTF8);
    assert_eq!(sniff(&[0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00]), "application/gzip");
    assert_eq!(sniff(&[0x80, 0x81, 0xfe, 0x00, 0x01]), OCTET_STREAM);
}

#[test]
fn multibyte_char_cut_at_read_limit_is_still_text() {
    let mut head = vec![b'a'; SNIFF_LEN - 1];
    head.push(0xC3); // first byte of a two-byte sequence
    assert_eq!(sniff(&head), TEXT_PLAIN_UTF8);

    let mut short = b"abc".to_vec();
    short.push(0xC3);
    assert_eq!(sniff(&short), OCTET_STREAM);
}
