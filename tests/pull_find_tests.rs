mod common;

use common::{MockRegistry, Route};
use openschema_cli::archive::{self, ArchiveError};
use openschema_cli::commands::{find, pull, Context};
use openschema_cli::error::CliError;
use openschema_cli::identifier::SchemaRef;
use openschema_cli::prompt::{Answer, ScriptedPrompter};
use openschema_cli::registry::{RegistryClient, RegistryError};
use openschema_cli::version::{latest_published, suggest_next_version};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn packed_tree() -> Vec<u8> {
    let src = TempDir::new().unwrap();
    fs::create_dir_all(src.path().join("docs")).unwrap();
    fs::write(src.path().join("schema.json"), r#"{"type":"object"}"#).unwrap();
    fs::write(src.path().join("docs/usage.md"), "# usage\n").unwrap();
    let entries = archive::list_entries(src.path()).unwrap();
    archive::pack(src.path(), &entries, |_| {}).unwrap().bytes
}

fn record_with(tarball: &[u8]) -> String {
    json!({
        "name": "person",
        "version": "1.2.3",
        "category": "people",
        "tags": [],
        "tarballBase64": base64::encode(tarball)
    })
    .to_string()
}

fn traversal_tar() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let data = b"owned";
    let mut header = tar::Header::new_gnu();
    let name = b"../../etc/passwd";
    header.as_old_mut().name[..name.len()].copy_from_slice(name);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();
    builder.append(&header, &data[..]).unwrap();
    builder.into_inner().unwrap()
}

#[tokio::test]
async fn test_pull_extracts_into_new_location() {
    let registry = MockRegistry::start(vec![Route::new(
        "GET",
        "/api/schema.json",
        200,
        record_with(&packed_tree()),
    )]);
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);

    let outcome = pull::run(&mut ctx, SchemaRef::parse("person:1.2.3").unwrap(), Some("out".into()))
        .await
        .unwrap();

    let target = cwd.path().join("out");
    assert_eq!(outcome.target, target);
    assert_eq!(outcome.version, "1.2.3");
    assert_eq!(outcome.summary.files, 2);
    assert_eq!(
        fs::read_to_string(target.join("schema.json")).unwrap(),
        r#"{"type":"object"}"#
    );
    assert_eq!(fs::read_to_string(target.join("docs/usage.md")).unwrap(), "# usage\n");
    assert!(prompter.asked().is_empty());

    let gets = registry.requests_to("GET", "/api/schema.json");
    assert_eq!(gets.len(), 1);
    assert!(gets[0].path.contains("name=person"));
    assert!(gets[0].path.contains("version=1.2.3"));
}

#[tokio::test]
async fn test_pull_into_non_empty_location_needs_confirmation() {
    let registry = MockRegistry::start(vec![Route::new(
        "GET",
        "/api/schema.json",
        200,
        record_with(&packed_tree()),
    )]);
    let cwd = TempDir::new().unwrap();
    fs::write(cwd.path().join("keep.txt"), "mine").unwrap();

    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);
    let err = pull::run(&mut ctx, SchemaRef::parse("person").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Aborted)));
    assert!(!cwd.path().join("schema.json").exists());

    let mut prompter = ScriptedPrompter::new([Answer::Confirmed(true)]);
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);
    pull::run(&mut ctx, SchemaRef::parse("person").unwrap(), None)
        .await
        .unwrap();
    assert!(cwd.path().join("schema.json").exists());
    assert_eq!(fs::read_to_string(cwd.path().join("keep.txt")).unwrap(), "mine");
}

#[tokio::test]
async fn test_pull_refuses_path_traversal() {
    let registry = MockRegistry::start(vec![Route::new(
        "GET",
        "/api/schema.json",
        200,
        record_with(&traversal_tar()),
    )]);
    let root = TempDir::new().unwrap();
    let cwd = root.path().join("a/b/c");
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.clone(), registry.settings(), &mut prompter);

    let err = pull::run(&mut ctx, SchemaRef::parse("person").unwrap(), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CliError>(),
        Some(CliError::Filesystem { .. })
    ));
    assert!(err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<ArchiveError>(), Some(ArchiveError::PathTraversal(_)))));
    assert!(!root.path().join("a/etc/passwd").exists());
    assert!(!root.path().join("etc/passwd").exists());
}

#[tokio::test]
async fn test_pull_unknown_schema_is_not_found() {
    let registry = MockRegistry::start(vec![Route::new(
        "GET",
        "/api/schema.json",
        404,
        "schema not found",
    )]);
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);

    let err = pull::run(&mut ctx, SchemaRef::parse("ghost").unwrap(), None)
        .await
        .unwrap_err();
    match err.downcast_ref::<CliError>() {
        Some(CliError::Network(RegistryError::NotFound { name, body })) => {
            assert_eq!(name, "ghost");
            assert_eq!(body, "schema not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_pull_record_without_tarball_fails() {
    let registry = MockRegistry::start(vec![Route::new(
        "GET",
        "/api/schema.json",
        200,
        r#"{"name":"person","version":"1.0.0"}"#,
    )]);
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);

    let err = pull::run(&mut ctx, SchemaRef::parse("person").unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CliError>(),
        Some(CliError::Network(RegistryError::Decode { .. }))
    ));
}

#[tokio::test]
async fn test_find_sends_single_discriminator() {
    let registry = MockRegistry::start(vec![Route::new(
        "POST",
        "/api/search",
        200,
        r#"[{"name":"person","version":"1.0.0","category":"people","tags":["a"],"status":"approved","downloads":3,"created":"2024-01-02T03:04:05Z"}]"#,
    )]);
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);

    let records = find::run(
        &mut ctx,
        Some("person".into()),
        None,
        Some("people".into()),
        Some(vec!["a".into()]),
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].downloads, 3);
    let body: Value = serde_json::from_slice(&registry.requests()[0].body).unwrap();
    assert_eq!(body, json!({ "name": "person", "category": "people" }));
}

#[tokio::test]
async fn test_find_failure_surfaces_body() {
    let registry = MockRegistry::start(vec![Route::new("POST", "/api/search", 500, "index offline")]);
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(cwd.path().to_path_buf(), registry.settings(), &mut prompter);

    let err = find::run(&mut ctx, None, None, None, None).await.unwrap_err();
    assert!(err.to_string().contains("index offline"));
}

#[tokio::test]
async fn test_suggest_next_version() {
    let registry = MockRegistry::start(vec![Route::new(
        "POST",
        "/api/search",
        200,
        r#"[{"name":"person","version":"1.2.3"}]"#,
    )]);
    let client = RegistryClient::new(&registry.settings()).unwrap();

    assert_eq!(
        suggest_next_version(&client, "person").await.map(|v| v.to_string()),
        Some("1.2.4".to_string())
    );
    assert_eq!(suggest_next_version(&client, "persona").await, None);
}

#[tokio::test]
async fn test_latest_published_picks_highest_version() {
    let registry = MockRegistry::start(vec![Route::new(
        "POST",
        "/api/search",
        200,
        r#"[{"name":"person","version":"1.0.0"},{"name":"person","version":"not-a-version"},{"name":"person","version":"2.1.0"},{"name":"personal","version":"9.0.0"},{"name":"person","version":"1.5.0"}]"#,
    )]);
    let client = RegistryClient::new(&registry.settings()).unwrap();

    assert_eq!(
        latest_published(&client, "person").await.map(|v| v.to_string()),
        Some("2.1.0".to_string())
    );
    assert_eq!(
        suggest_next_version(&client, "person").await.map(|v| v.to_string()),
        Some("2.1.1".to_string())
    );
}

#[tokio::test]
async fn test_version_lookup_failures_collapse_to_none() {
    let empty = MockRegistry::start(vec![Route::new("POST", "/api/search", 200, "[]")]);
    let client = RegistryClient::new(&empty.settings()).unwrap();
    assert_eq!(latest_published(&client, "person").await, None);

    let broken = MockRegistry::start(vec![Route::new("POST", "/api/search", 500, "boom")]);
    let client = RegistryClient::new(&broken.settings()).unwrap();
    assert_eq!(suggest_next_version(&client, "person").await, None);

    let garbled = MockRegistry::start(vec![Route::new(
        "POST",
        "/api/search",
        200,
        r#"[{"name":"person","version":"one"}]"#,
    )]);
    let client = RegistryClient::new(&garbled.settings()).unwrap();
    assert_eq!(suggest_next_version(&client, "person").await, None);
}

#[test]
fn test_pack_unpack_round_trip() {
    let src = TempDir::new().unwrap();
    let files: &[(&str, &[u8])] = &[
        ("openschema.json", br#"{"name":"person"}"#),
        ("schema.json", b"{}"),
        ("docs/a/b/deep.txt", b"deep"),
        ("assets/blob.bin", &[0, 159, 146, 150, 255]),
    ];
    for (path, data) in files {
        let full = src.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, data).unwrap();
    }

    let entries = archive::list_entries(src.path()).unwrap();
    let packed = archive::pack(src.path(), &entries, |_| {}).unwrap();
    assert_eq!(packed.file_count, files.len());

    let dst = TempDir::new().unwrap();
    let summary = archive::unpack(&packed.bytes, dst.path()).unwrap();
    assert_eq!(summary.files, files.len());
    assert_eq!(summary.bytes, packed.unpacked_size);
    for (path, data) in files {
        assert_eq!(fs::read(dst.path().join(path)).unwrap(), *data, "{path}");
    }
}

#[test]
fn test_unpack_refuses_traversal_entry() {
    let root = TempDir::new().unwrap();
    let target = root.path().join("x/y");
    let err = archive::unpack(&traversal_tar(), &target).unwrap_err();
    assert!(matches!(err, ArchiveError::PathTraversal(p) if p == Path::new("../../etc/passwd")));
    assert!(!root.path().join("etc/passwd").exists());
}
