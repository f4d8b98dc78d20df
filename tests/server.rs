// tests/server.rs

use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use assetflow::config::ServeConfig;
use assetflow::engine::{TaskContext, TaskRegistry};
use assetflow::fs::RealFileSystem;
use assetflow::server::{inject_snippet, reserve_port, snippet};
use assetflow::tasks::serve::ServeAddrs;
use assetflow::tasks::{ServeTask, Task};
use assetflow::types::ReloadKind;
use assetflow_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

type TestResult = Result<(), Box<dyn Error>>;

fn serve_config() -> ServeConfig {
    ServeConfig {
        root: "build".to_string(),
        index: "search.html".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        reload_port: Some(0),
        cors: true,
    }
}

fn site() -> std::io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    let build = dir.path().join("build");
    fs::create_dir_all(build.join("css"))?;
    fs::write(
        build.join("search.html"),
        "<html><body><h1>Search</h1></body></html>",
    )?;
    fs::write(build.join("css/site.css"), "body{margin:0}")?;
    Ok(dir)
}

async fn start(dir: &TempDir) -> Result<(TaskContext, ServeAddrs), Box<dyn Error>> {
    let ctx = TaskContext::new(dir.path(), Arc::new(RealFileSystem), TaskRegistry::new());
    let task = ServeTask::new("server", serve_config());
    task.run(&ctx).await?;
    let addrs = task.addrs().ok_or("serve task did not record its addresses")?;
    Ok((ctx, addrs))
}

/// Raw HTTP/1.1 GET; returns the whole response, headers included.
async fn get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nOrigin: http://example.test\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await?;
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

#[test]
fn snippet_goes_before_the_closing_body_tag() {
    assert_eq!(
        inject_snippet("<html><BODY><p>x</p></BODY></html>", "go()"),
        "<html><BODY><p>x</p><script>go()</script></BODY></html>"
    );
    assert_eq!(inject_snippet("<p>fragment</p>", "go()"), "<p>fragment</p><script>go()</script>");
}

#[test]
fn snippet_connects_to_the_reload_port() {
    let js = snippet(4321);
    assert!(js.contains("new WebSocket"));
    assert!(js.contains(":4321"));
    assert!(js.contains("\"inject\""));
}

#[test]
fn explicit_reload_port_must_be_free() -> TestResult {
    let (_held, port) = reserve_port(Some(0))?;
    assert!(reserve_port(Some(port)).is_err());
    Ok(())
}

#[tokio::test]
async fn index_is_served_with_reload_script_and_cors() -> TestResult {
    init_tracing();
    let dir = site()?;
    let (ctx, addrs) = start(&dir).await?;
    assert_eq!(ctx.services().len(), 1);

    let page = with_timeout(get(addrs.http, "/")).await?;
    assert!(page.starts_with("HTTP/1.1 200"), "got {page}");
    assert!(page.contains("<h1>Search</h1>"));
    assert!(page.contains("new WebSocket"));
    assert!(page.contains(&format!(":{}", addrs.reload_port)));
    assert!(page.to_ascii_lowercase().contains("access-control-allow-origin: *"));

    let css = with_timeout(get(addrs.http, "/css/site.css")).await?;
    assert!(css.starts_with("HTTP/1.1 200"));
    assert!(css.contains("body{margin:0}"));
    assert!(!css.contains("WebSocket"));

    let missing = with_timeout(get(addrs.http, "/nope.html")).await?;
    assert!(missing.starts_with("HTTP/1.1 404"));

    ctx.services().shutdown();
    assert!(ctx.services().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn notifications_reach_connected_browsers() -> TestResult {
    init_tracing();
    let dir = site()?;
    let (ctx, addrs) = start(&dir).await?;

    let url = format!("ws://127.0.0.1:{}", addrs.reload_port);
    let browser = tokio::task::spawn_blocking(move || -> Result<Vec<String>, String> {
        let (mut socket, _) = tungstenite::connect(url).map_err(|e| e.to_string())?;
        let mut received = Vec::new();
        while received.len() < 2 {
            let message = socket.read().map_err(|e| e.to_string())?;
            if message.is_text() {
                received.push(message.to_text().map_err(|e| e.to_string())?.to_string());
            }
        }
        Ok(received)
    });

    // Give the accept thread time to register the client.
    tokio::time::sleep(Duration::from_millis(300)).await;
    ctx.notifier().notify(ReloadKind::None);
    ctx.notifier().notify(ReloadKind::Inject);
    ctx.notifier().notify(ReloadKind::Reload);

    let received = with_timeout(browser).await??;
    assert_eq!(received, vec!["inject", "reload"]);

    ctx.services().shutdown();
    Ok(())
}
