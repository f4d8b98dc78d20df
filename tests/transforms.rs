// tests/transforms.rs

use std::error::Error;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::engine::{Notifier, TaskContext, TaskRegistry};
use assetflow::fs::{FileSet, FileSystem, MockFileSystem, glob_base};
use assetflow::tasks::html::minify_html;
use assetflow::tasks::images::minify_svg;
use assetflow::tasks::{
    CleanTask, CopyFiles, FileTask, Html, Images, Sprite, Styles, Task, Transform, Webp,
};
use assetflow::types::ReloadKind;
use image::{ImageFormat, Rgb, RgbImage};
use tokio::sync::broadcast::error::TryRecvError;

type TestResult = Result<(), Box<dyn Error>>;

fn file_set(patterns: &[&str]) -> FileSet {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    FileSet::new(&patterns).expect("valid patterns")
}

fn apply(
    transform: &dyn Transform,
    fs: &MockFileSystem,
    patterns: &[&str],
    dest: &str,
) -> anyhow::Result<usize> {
    let files = file_set(patterns).collect(fs, Path::new("."))?;
    transform.apply(fs, &files, &Path::new(".").join(dest))
}

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(16, 16, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

#[test]
fn glob_base_stops_at_first_wildcard_component() {
    assert_eq!(glob_base("source/sass/style.scss"), "source/sass");
    assert_eq!(glob_base("./source/img/**/*.{png,jpg}"), "source/img");
    assert_eq!(glob_base("source/*.html"), "source");
    assert_eq!(glob_base("**/*.svg"), "");
}

#[test]
fn single_star_does_not_cross_directories() {
    let set = file_set(&["source/*.html"]);
    assert!(set.matches("source/index.html"));
    assert!(!set.matches("source/pages/about.html"));
}

#[test]
fn exclusions_win_over_includes() {
    let set = file_set(&["source/img/**/*.svg", "!source/img/flag/**"]);
    assert!(set.matches("source/img/icons/menu.svg"));
    assert!(!set.matches("source/img/flag/de.svg"));
}

#[test]
fn collect_keeps_paths_relative_to_the_glob_base() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/img/logo.png", "a");
    fs.add_file("./source/img/icons/menu.svg", "b");
    fs.add_file("./source/img/icons/notes.txt", "c");
    fs.add_file("./source/index.html", "d");

    let files = file_set(&["source/img/**/*.{png,svg}", "source/img/**/*.png"])
        .collect(&fs, Path::new("."))?;

    let relative: Vec<PathBuf> = files.iter().map(|f| f.relative.clone()).collect();
    assert_eq!(
        relative,
        vec![PathBuf::from("icons/menu.svg"), PathBuf::from("logo.png")]
    );
    Ok(())
}

#[test]
fn missing_base_directory_is_an_empty_set() -> TestResult {
    let fs = MockFileSystem::new();
    let files = file_set(&["source/fonts/**/*.woff2"]).collect(&fs, Path::new("."))?;
    assert!(files.is_empty());
    Ok(())
}

#[test]
fn copy_mirrors_the_tree_under_dest() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/js/app.js", "console.log(1);");
    fs.add_file("./source/js/vendor/lib.js", "lib();");

    let written = apply(&CopyFiles, &fs, &["source/js/**/*.js"], "build/js")?;

    assert_eq!(written, 2);
    assert_eq!(fs.read_to_string(Path::new("./build/js/app.js"))?, "console.log(1);");
    assert_eq!(fs.read_to_string(Path::new("./build/js/vendor/lib.js"))?, "lib();");
    Ok(())
}

#[test]
fn styles_compile_to_compressed_css_and_skip_partials() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "./source/sass/style.scss",
        "$accent: red;\n.page {\n  .title { color: $accent; }\n}\n",
    );
    fs.add_file("./source/sass/_mixins.scss", "@mixin x { color: blue; }");

    let written = apply(&Styles::new(None), &fs, &["source/sass/*.scss"], "build/css")?;

    assert_eq!(written, 1);
    let css = fs.read_to_string(Path::new("./build/css/style.css"))?;
    assert!(css.contains(".page .title{color:red}"), "got {css:?}");
    assert!(!fs.exists(Path::new("./build/css/_mixins.css")));
    Ok(())
}

#[test]
fn styles_rename_output() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/sass/search.scss", "a { b: c }");

    apply(
        &Styles::new(Some("search.min.css".to_string())),
        &fs,
        &["source/sass/search.scss"],
        "build/css",
    )?;

    assert!(fs.is_file(Path::new("./build/css/search.min.css")));
    Ok(())
}

#[test]
fn styles_resolve_imports_through_the_task_filesystem() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/sass/_vars.scss", "$gap: 4px;");
    fs.add_file("./source/sass/site.scss", "@import 'vars';\nbody { margin: $gap; }\n");

    let written = apply(&Styles::new(None), &fs, &["source/sass/*.scss"], "build/css")?;

    assert_eq!(written, 1);
    let css = fs.read_to_string(Path::new("./build/css/site.css"))?;
    assert_eq!(css.trim(), "body{margin:4px}");
    Ok(())
}

#[test]
fn styles_rename_rejects_several_entry_points() {
    let fs = MockFileSystem::new();
    fs.add_file("./source/sass/search.scss", "a { b: c }");
    fs.add_file("./source/sass/print.scss", "p { d: e }");
    fs.add_file("./source/sass/_vars.scss", "$gap: 4px;");

    let err = apply(
        &Styles::new(Some("site.min.css".to_string())),
        &fs,
        &["source/sass/*.scss"],
        "build/css",
    )
    .expect_err("two entry points cannot share one output name");

    let message = format!("{err:#}");
    assert!(message.contains("site.min.css"), "got {message}");
    assert!(message.contains("found 2"), "got {message}");
    assert!(!fs.exists(Path::new("./build/css")));
}

#[test]
fn invalid_scss_fails_with_the_file_name() {
    let fs = MockFileSystem::new();
    fs.add_file("./source/sass/broken.scss", ".a { color: ");

    let err = apply(&Styles::new(None), &fs, &["source/sass/*.scss"], "build/css")
        .expect_err("broken stylesheet must fail");
    assert!(format!("{err:#}").contains("broken.scss"));
}

#[test]
fn html_minify_collapses_whitespace_outside_protected_blocks() {
    let input = "<html>\n  <body>\n    <p>Hello   world</p>\n    <pre>  keep\n  this </pre>\n  </body>\n</html>\n";
    assert_eq!(
        minify_html(input),
        "<html><body><p>Hello world</p><pre>  keep\n  this </pre></body></html>"
    );

    let script = "<div>\n</div>\n<script>\n  if (a  <  b) {}\n</script>";
    assert_eq!(
        minify_html(script),
        "<div></div><script>\n  if (a  <  b) {}\n</script>"
    );
}

#[test]
fn html_minify_keeps_the_space_between_inline_siblings() {
    let nav = "<nav>\n  <a href=\"/\">Home</a>\n  <a href=\"/about\">About</a>\n</nav>\n";
    assert_eq!(
        minify_html(nav),
        "<nav><a href=\"/\">Home</a> <a href=\"/about\">About</a></nav>"
    );

    let words = "<p><em>fast</em>\n<strong>small</strong> <span>sites</span></p>";
    assert_eq!(
        minify_html(words),
        "<p><em>fast</em> <strong>small</strong> <span>sites</span></p>"
    );

    assert_eq!(
        minify_html("<li>a</li>\n<li><b>b</b></li>"),
        "<li>a</li><li><b>b</b></li>"
    );
}

#[test]
fn html_task_writes_minified_markup() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/index.html", "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n");

    apply(&Html, &fs, &["source/*.html"], "build")?;

    assert_eq!(
        fs.read_to_string(Path::new("./build/index.html"))?,
        "<ul><li>a</li><li>b</li></ul>"
    );
    Ok(())
}

#[test]
fn svg_minify_drops_comments_and_layout_whitespace() {
    let svg = "<!-- generator -->\n<svg viewBox=\"0 0 1 1\">\n  <path d=\"M0 0\"/>\n</svg>\n";
    assert_eq!(
        minify_svg(svg),
        "<svg viewBox=\"0 0 1 1\"><path d=\"M0 0\"/></svg>"
    );
}

#[test]
fn images_never_grow_and_copy_unknown_files() -> TestResult {
    let fs = MockFileSystem::new();
    let png = png_bytes();
    fs.add_file("./source/img/pattern.png", png.clone());
    fs.add_file("./source/img/icon.svg", "<svg>\n  <!-- x -->\n  <g/>\n</svg>");
    fs.add_file("./source/img/readme.txt", "keep me");

    let written = apply(&Images::new(None), &fs, &["source/img/*"], "build/img")?;

    assert_eq!(written, 3);
    let optimised = fs.read(Path::new("./build/img/pattern.png"))?;
    assert!(optimised.len() <= png.len());
    assert!(image::load_from_memory(&optimised).is_ok());
    assert_eq!(
        fs.read_to_string(Path::new("./build/img/icon.svg"))?,
        "<svg><g/></svg>"
    );
    assert_eq!(fs.read_to_string(Path::new("./build/img/readme.txt"))?, "keep me");
    Ok(())
}

#[test]
fn webp_writes_siblings_for_raster_inputs_only() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/img/photo.png", png_bytes());
    fs.add_file("./source/img/icon.svg", "<svg/>");

    let written = apply(&Webp, &fs, &["source/img/**/*"], "build/img")?;

    assert_eq!(written, 1);
    let webp = fs.read(Path::new("./build/img/photo.webp"))?;
    assert_eq!(&webp[..4], b"RIFF");
    assert!(!fs.exists(Path::new("./build/img/icon.webp")));
    Ok(())
}

#[test]
fn sprite_combines_symbols_with_view_boxes() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file(
        "./source/img/icons/menu.svg",
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\">\n  <path d=\"M1 1\"/>\n</svg>",
    );
    fs.add_file("./source/img/icons/close.svg", "<svg viewBox='0 0 8 8'><g/></svg>");

    let written = apply(&Sprite::new(None), &fs, &["source/img/icons/*.svg"], "build/img")?;

    assert_eq!(written, 1);
    assert_eq!(
        fs.read_to_string(Path::new("./build/img/sprite.svg"))?,
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\">",
            "<symbol id=\"close\" viewBox=\"0 0 8 8\"><g/></symbol>",
            "<symbol id=\"menu\" viewBox=\"0 0 24 24\"><path d=\"M1 1\"/></symbol>",
            "</svg>"
        )
    );
    Ok(())
}

#[test]
fn sprite_rejects_duplicate_ids_and_skips_empty_input() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/img/a/flag.svg", "<svg><g/></svg>");
    fs.add_file("./source/img/b/flag.svg", "<svg><g/></svg>");

    let err = apply(&Sprite::new(None), &fs, &["source/img/**/*.svg"], "build/img")
        .expect_err("duplicate ids must fail");
    assert!(err.to_string().contains("duplicate symbol id 'flag'"));

    let written = apply(
        &Sprite::new(Some("flags.svg".to_string())),
        &fs,
        &["source/none/*.svg"],
        "build/img",
    )?;
    assert_eq!(written, 0);
    assert!(!fs.exists(Path::new("./build/img/flags.svg")));
    Ok(())
}

#[tokio::test]
async fn file_task_notifies_only_after_writing() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./source/js/app.js", "x");
    let notifier = Notifier::new();
    let mut rx = notifier.subscribe();
    let ctx = TaskContext::new(".", Arc::new(fs.clone()), TaskRegistry::new())
        .with_notifier(notifier);

    let js = FileTask::new(file_set(&["source/js/*.js"]), "build/js", CopyFiles)
        .with_reload(ReloadKind::Reload);
    js.run(&ctx).await?;
    assert_eq!(rx.try_recv()?, ReloadKind::Reload);

    let fonts = FileTask::new(file_set(&["source/fonts/*"]), "build/fonts", CopyFiles)
        .with_reload(ReloadKind::Reload);
    fonts.run(&ctx).await?;
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    Ok(())
}

#[tokio::test]
async fn clean_is_idempotent_on_the_mock_filesystem() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("./build/css/style.css", "a{}");
    fs.add_file("./source/index.html", "<p></p>");
    let ctx = TaskContext::new(".", Arc::new(fs.clone()), TaskRegistry::new());

    let clean = CleanTask::new("build");
    clean.run(&ctx).await?;
    clean.run(&ctx).await?;

    assert!(!fs.exists(Path::new("./build")));
    assert!(!fs.exists(Path::new("./build/css/style.css")));
    assert!(fs.exists(Path::new("./source/index.html")));
    Ok(())
}
