use openschema_cli::commands::{compile, init, version, Context};
use openschema_cli::config::{self, Settings};
use openschema_cli::error::CliError;
use openschema_cli::prompt::{Answer, Prompt, ScriptedPrompter};
use openschema_cli::version::BumpKind;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_init_scaffolds_project() {
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::new([
        Answer::Text("bad name!".into()),
        Answer::Text("my-schema".into()),
        Answer::Text("proj".into()),
        Answer::Confirmed(true),
        Answer::Text("mit".into()),
        Answer::Selected(0),
        Answer::Text("Jane Doe".into()),
        Answer::Confirmed(true),
    ]);
    let mut ctx = Context::new(cwd.path().to_path_buf(), Settings::default(), &mut prompter);

    let outcome = init::run(&mut ctx).unwrap();

    let dir = cwd.path().join("proj");
    assert_eq!(outcome.name, "my-schema");
    assert_eq!(outcome.path, dir);
    assert_eq!(outcome.license, Some("MIT"));
    assert!(outcome.typescript);
    assert_eq!(prompter.asked().len(), 8);

    assert_eq!(
        read_json(&dir.join("openschema.json")),
        json!({ "name": "my-schema", "version": "0.0.1", "description": "", "category": "", "tags": [] })
    );
    let schema = read_json(&dir.join("schema.json"));
    assert_eq!(schema["$schema"], "https://json-schema.org/draft/2020-12/schema");
    assert_eq!(schema["type"], "object");
    assert!(fs::read_to_string(dir.join("README.md")).unwrap().starts_with("# my-schema\n"));
    assert_eq!(fs::read_to_string(dir.join("CHANGELOG.md")).unwrap(), "");
    let license = fs::read_to_string(dir.join("LICENSE")).unwrap();
    assert!(license.starts_with("MIT License"));
    assert!(license.contains("Jane Doe"));
    assert_eq!(
        fs::read_to_string(dir.join("schema.ts")).unwrap(),
        "export interface MySchema {}\n"
    );

    // the scaffold is a loadable project
    let cfg = config::load(&dir).unwrap();
    assert_eq!(cfg.version, "0.0.1");
}

#[test]
fn test_init_defaults_to_named_directory_without_license() {
    let cwd = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::new([
        Answer::Text("person".into()),
        Answer::Text("./person".into()),
        Answer::Confirmed(false),
    ]);
    let mut ctx = Context::new(cwd.path().to_path_buf(), Settings::default(), &mut prompter);

    let outcome = init::run(&mut ctx).unwrap();

    let dir = cwd.path().join("person");
    assert_eq!(outcome.license, None);
    assert!(!outcome.typescript);
    assert!(dir.join("openschema.json").exists());
    assert!(!dir.join("LICENSE").exists());
    assert!(!dir.join("schema.ts").exists());
    match &prompter.asked()[1] {
        Prompt::Input { default, .. } => assert_eq!(default.as_deref(), Some("./person")),
        other => panic!("unexpected prompt {other:?}"),
    }
}

#[test]
fn test_init_declined_overwrite_leaves_directory_alone() {
    let cwd = TempDir::new().unwrap();
    fs::create_dir(cwd.path().join("person")).unwrap();
    let mut prompter = ScriptedPrompter::new([
        Answer::Text("person".into()),
        Answer::Text("person".into()),
    ]);
    let mut ctx = Context::new(cwd.path().to_path_buf(), Settings::default(), &mut prompter);

    let err = init::run(&mut ctx).unwrap_err();

    assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Aborted)));
    assert!(fs::read_dir(cwd.path().join("person")).unwrap().next().is_none());
}

#[test]
fn test_version_bump_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("openschema.json"),
        r#"{"name":"person","version":"1.2.3","description":"d","category":"c","tags":["x"],"homepage":"https://example.com"}"#,
    )
    .unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);

    let next = version::run(&mut ctx, BumpKind::Minor, None).unwrap();
    assert_eq!(next.to_string(), "1.3.0");
    let next = version::run(&mut ctx, BumpKind::Prerelease, None).unwrap();
    assert_eq!(next.to_string(), "1.3.1-0");

    let on_disk = read_json(&dir.path().join("openschema.json"));
    assert_eq!(on_disk["version"], "1.3.1-0");
    assert_eq!(on_disk["homepage"], "https://example.com");
    assert_eq!(on_disk["tags"], json!(["x"]));
}

#[test]
fn test_version_rejects_unparsable_version_without_writing() {
    let dir = TempDir::new().unwrap();
    let original = r#"{"name":"person","version":"1.2"}"#;
    fs::write(dir.path().join("openschema.json"), original).unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);

    let err = version::run(&mut ctx, BumpKind::Patch, None).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CliError>(),
        Some(CliError::UserInput { .. })
    ));
    assert_eq!(
        fs::read_to_string(dir.path().join("openschema.json")).unwrap(),
        original
    );
}

#[test]
fn test_version_without_project_is_user_error() {
    let dir = TempDir::new().unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);

    let err = version::run(&mut ctx, BumpKind::Patch, None).unwrap_err();
    assert!(err.to_string().contains("openschema.json"));
}

const DECLARATIONS: &str = r#"
/** A human being */
export interface Person {
    name: string;
    nickname?: string;
    pets: Pet[];
}

export type Pet = { kind: "cat" | "dog"; name: string };
"#;

#[test]
fn test_compile_writes_schema() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.ts"), DECLARATIONS).unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);

    let out = compile::run(
        &mut ctx,
        Path::new("schema.ts"),
        Path::new("schema.json"),
        "Person",
        Path::new("tsconfig.json"),
    )
    .unwrap();

    assert_eq!(out, dir.path().join("schema.json"));
    let schema = read_json(&out);
    assert_eq!(schema["$ref"], "#/definitions/Person");
    assert_eq!(schema["definitions"]["Person"]["required"], json!(["name", "pets"]));
    assert_eq!(
        schema["definitions"]["Pet"]["properties"]["kind"],
        json!({ "type": "string", "enum": ["cat", "dog"] })
    );
}

#[test]
fn test_compile_existing_output_needs_confirmation() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.ts"), DECLARATIONS).unwrap();
    fs::write(dir.path().join("schema.json"), "{}").unwrap();

    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);
    let err = compile::run(
        &mut ctx,
        Path::new("schema.ts"),
        Path::new("schema.json"),
        "*",
        Path::new("tsconfig.json"),
    )
    .unwrap_err();
    assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Aborted)));
    assert_eq!(fs::read_to_string(dir.path().join("schema.json")).unwrap(), "{}");

    let mut prompter = ScriptedPrompter::new([Answer::Confirmed(true)]);
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);
    compile::run(
        &mut ctx,
        Path::new("schema.ts"),
        Path::new("schema.json"),
        "*",
        Path::new("tsconfig.json"),
    )
    .unwrap();
    let schema = read_json(&dir.path().join("schema.json"));
    assert!(schema.get("$ref").is_none());
    assert_eq!(schema["definitions"].as_object().unwrap().len(), 2);
}

#[test]
fn test_compile_rejects_non_typescript_source() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("schema.js"), "module.exports = {}").unwrap();
    let mut prompter = ScriptedPrompter::default();
    let mut ctx = Context::new(dir.path().to_path_buf(), Settings::default(), &mut prompter);

    let err = compile::run(
        &mut ctx,
        Path::new("schema.js"),
        Path::new("schema.json"),
        "*",
        Path::new("tsconfig.json"),
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CliError>(),
        Some(CliError::UserInput { .. })
    ));
    assert!(!dir.path().join("schema.json").exists());
}
