// tests/config_validation.rs

use std::error::Error;
use std::io::Write;
use std::path::Path;

use assetflow::config::{ConfigFile, PipelineNode, TaskConfig, load_and_validate, parse_str};
use assetflow::errors::AssetflowError;
use assetflow::graph::{Node, resolve_target, resolve_targets};
use assetflow::types::ReloadKind;
use assetflow_test_utils::builders::{
    ConfigFileBuilder, FileTaskBuilder, WatchRuleBuilder, clean, copy, parallel, serve, series,
    task_ref,
};
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

fn validate(toml: &str) -> Result<ConfigFile, AssetflowError> {
    ConfigFile::try_from(parse_str(toml)?)
}

fn expect_config_error(toml: &str, needle: &str) {
    match validate(toml) {
        Err(AssetflowError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}")
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn parses_every_task_kind_and_defaults() -> TestResult {
    let cfg = validate(
        r#"
[task.clean]
kind = "clean"
path = "build"

[task.styles]
kind = "styles"
src = "source/sass/style.scss"
dest = "build/css"
rename = "style.min.css"
reload = "inject"

[task.images]
kind = "images"
src = ["source/img/**/*.{png,jpg,svg}"]
dest = "build/img"
quality = 75

[task.server]
kind = "serve"
root = "build"

[task.watcher]
kind = "watch"

[pipeline.build]
series = ["clean", { parallel = ["styles", "images"] }]

[pipeline.default]
series = ["build", { parallel = ["server", "watcher"] }]

[[watch]]
glob = "source/sass/**/*.scss"
run = "styles"
"#,
    )?;

    assert_eq!(cfg.config().default_target, "default");
    assert!(!cfg.config().use_hash);

    let TaskConfig::Styles(styles) = &cfg.tasks()["styles"] else {
        panic!("styles should parse as a styles task");
    };
    assert_eq!(styles.src, vec!["source/sass/style.scss"]);
    assert_eq!(styles.rename.as_deref(), Some("style.min.css"));
    assert_eq!(styles.reload, ReloadKind::Inject);

    let TaskConfig::Serve(server) = &cfg.tasks()["server"] else {
        panic!("server should parse as a serve task");
    };
    assert_eq!(server.index, "index.html");
    assert_eq!(server.host, "127.0.0.1");
    assert_eq!(server.port, 3000);
    assert_eq!(server.reload_port, None);
    assert!(server.cors);

    assert!(matches!(cfg.tasks()["watcher"], TaskConfig::Watch));
    assert_eq!(cfg.watch_rules()[0].reload, ReloadKind::None);
    assert_eq!(cfg.watch_rules()[0].run, vec!["styles"]);
    Ok(())
}

#[test]
fn pipelines_are_inlined_into_one_graph() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task("clean", clean("build"))
        .with_task("a", copy("source/a/*", "build/a"))
        .with_task("b", copy("source/b/*", "build/b"))
        .with_pipeline("assets", parallel(&["a", "b"]))
        .with_pipeline("build", series(&["clean", "assets"]))
        .build();

    let graph = resolve_target(&cfg, "build")?;
    assert_eq!(
        graph,
        Node::series([
            Node::task("clean"),
            Node::parallel([Node::task("a"), Node::task("b")]),
        ])
    );

    let single = resolve_targets(&cfg, &["a".to_string()])?;
    assert_eq!(single, Node::task("a"));

    let several = resolve_targets(&cfg, &["clean".to_string(), "b".to_string()])?;
    assert_eq!(several, Node::series([Node::task("clean"), Node::task("b")]));

    assert!(matches!(
        resolve_target(&cfg, "nope"),
        Err(AssetflowError::TaskNotFound(name)) if name == "nope"
    ));
    Ok(())
}

#[test]
fn pipeline_cycle_returns_structured_error() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[task.a]
kind = "clean"
path = "build"

[pipeline.one]
series = ["a", "two"]

[pipeline.two]
parallel = ["one"]
"#
    )?;

    match load_and_validate(file.path()) {
        Err(AssetflowError::PipelineCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("one") || msg.contains("two"));
        }
        Err(e) => panic!("Expected PipelineCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn unknown_pipeline_reference_is_rejected() {
    expect_config_error(
        r#"
[task.a]
kind = "clean"
path = "build"

[pipeline.build]
series = ["a", "missing"]
"#,
        "missing",
    );
}

#[test]
fn self_referencing_pipeline_is_rejected() {
    expect_config_error(
        r#"
[task.a]
kind = "clean"
path = "build"

[pipeline.loop]
series = ["a", "loop"]
"#,
        "itself",
    );
}

#[test]
fn empty_config_is_rejected() {
    expect_config_error("", "at least one");
}

#[test]
fn task_and_pipeline_names_must_differ() {
    let raw = ConfigFileBuilder::new()
        .with_task("build", clean("build"))
        .with_pipeline("build", task_ref("build"))
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(AssetflowError::ConfigError(msg)) => assert!(msg.contains("both")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn rename_is_limited_to_styles_and_sprite() {
    let raw = ConfigFileBuilder::new()
        .with_task(
            "fonts",
            TaskConfig::Copy(
                FileTaskBuilder::new("source/fonts/*", "build/fonts")
                    .rename("font.woff")
                    .build(),
            ),
        )
        .build_raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(AssetflowError::ConfigError(msg)) if msg.contains("rename")
    ));
}

#[test]
fn quality_must_be_a_percentage() {
    expect_config_error(
        r#"
[task.images]
kind = "images"
src = "source/img/*.jpg"
dest = "build/img"
quality = 0
"#,
        "quality",
    );
}

#[test]
fn file_tasks_need_an_include_pattern() {
    expect_config_error(
        r#"
[task.copy]
kind = "copy"
src = ["!source/**/*.tmp"]
dest = "build"
"#,
        "src",
    );
}

#[test]
fn invalid_globs_are_rejected() {
    expect_config_error(
        r#"
[task.copy]
kind = "copy"
src = ["source/[a-"]
dest = "build"
"#,
        "src",
    );
}

#[test]
fn watch_rules_may_not_rerun_services() {
    let raw = ConfigFileBuilder::new()
        .with_task("server", serve("build"))
        .with_task("js", copy("source/js/*.js", "build/js"))
        .with_pipeline("dev", series(&["js", "server"]))
        .with_watch(WatchRuleBuilder::new("source/js/*.js", "dev").build())
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(AssetflowError::ConfigError(msg)) => {
            assert!(msg.contains("server"));
            assert!(msg.contains("never finishes"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn watch_rules_need_known_targets() {
    expect_config_error(
        r#"
[task.js]
kind = "copy"
src = "source/js/*.js"
dest = "build/js"

[[watch]]
glob = "source/js/*.js"
run = ["js", "reload"]
"#,
        "reload",
    );
}

#[test]
fn watch_use_hash_falls_back_to_config_default() -> TestResult {
    let cfg = validate(
        r#"
[config]
use_hash = true

[task.js]
kind = "copy"
src = "source/js/*.js"
dest = "build/js"

[[watch]]
glob = "source/js/*.js"
run = "js"

[[watch]]
glob = "source/*.html"
run = "js"
use_hash = false
"#,
    )?;

    let default = cfg.config().use_hash;
    assert!(cfg.watch_rules()[0].effective_use_hash(default));
    assert!(!cfg.watch_rules()[1].effective_use_hash(default));
    Ok(())
}

#[test]
fn unknown_kind_is_a_toml_error() {
    let result = parse_str(
        r#"
[task.js]
kind = "uglify"
src = "source/js/*.js"
dest = "build/js"
"#,
    );
    assert!(matches!(result, Err(AssetflowError::TomlError(_))));
}

#[test]
fn pipeline_nodes_accept_nested_tables() -> TestResult {
    let raw = parse_str(
        r#"
[task.a]
kind = "clean"
path = "a"

[task.b]
kind = "clean"
path = "b"

[pipeline.p]
parallel = ["a", { series = ["b", "a"] }]
"#,
    )?;

    let PipelineNode::Parallel { parallel } = &raw.pipeline["p"] else {
        panic!("expected a parallel node");
    };
    assert_eq!(parallel.len(), 2);
    assert_eq!(raw.pipeline["p"].references(), vec!["a", "b", "a"]);
    Ok(())
}

#[test]
fn demo_config_is_valid() -> TestResult {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/Assetflow.toml");
    let cfg = load_and_validate(&path)?;

    let graph = resolve_target(&cfg, &cfg.config().default_target)?;
    let leaves = graph.leaves();
    assert_eq!(leaves.first(), Some(&"clean"));
    assert!(leaves.contains(&"server"));
    assert!(leaves.contains(&"watcher"));
    assert_eq!(cfg.watch_rules().len(), 4);
    Ok(())
}
