use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct SessionCreated {
    session_id: u64,
}

#[derive(Debug, Deserialize)]
struct Stats {
    total_clicks: u64,
    session_duration_seconds: i64,
    average_clicks_per_minute: f64,
}

#[derive(Debug, Deserialize)]
struct Entry {
    click_number: u64,
    label: String,
}

#[derive(Debug, Deserialize)]
struct ClickOutcome {
    stats: Stats,
    entry: Entry,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.post(format!("{base_url}/api/sessions")).send().await {
            if resp.status().is_success() {
                let created: SessionCreated = resp.json().await.unwrap();
                let deleted = client
                    .delete(format!("{base_url}/api/sessions/{}", created.session_id))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(deleted.status().as_u16(), 204);
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_click_stats"))
        .env("PORT", port.to_string())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn new_session(client: &Client, base_url: &str) -> u64 {
    let created: SessionCreated = client
        .post(format!("{base_url}/api/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    created.session_id
}

async fn click(client: &Client, base_url: &str, id: u64) -> ClickOutcome {
    let response = client
        .post(format!("{base_url}/api/sessions/{id}/click"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_clicks_update_stats_and_history() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let id = new_session(&client, &server.base_url).await;

    for n in 1..=3 {
        let outcome = click(&client, &server.base_url, id).await;
        assert_eq!(outcome.stats.total_clicks, n);
        assert_eq!(outcome.entry.click_number, n);
        assert!(outcome.entry.label.starts_with(&format!("Click #{n} at ")));
        assert!(outcome.stats.average_clicks_per_minute.is_finite());
    }

    let stats: Stats = client
        .get(format!("{}/api/sessions/{id}/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_clicks, 3);
    assert!(stats.session_duration_seconds >= 0);

    let peak: serde_json::Value = client
        .get(format!("{}/api/sessions/{id}/peak", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(peak["kind"], "current_minute");
    assert_eq!(peak["count"], 3);

    let histogram: serde_json::Value = client
        .get(format!("{}/api/sessions/{id}/histogram", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let bars = histogram["bars"].as_array().unwrap();
    let total: u64 = bars.iter().map(|bar| bar["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn http_clear_empties_history_but_keeps_session() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let id = new_session(&client, &server.base_url).await;

    click(&client, &server.base_url, id).await;
    click(&client, &server.base_url, id).await;

    let response = client
        .post(format!("{}/api/sessions/{id}/clear", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let history: Vec<serde_json::Value> = client
        .get(format!("{}/api/sessions/{id}/history", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history.is_empty());

    let outcome = click(&client, &server.base_url, id).await;
    assert_eq!(outcome.stats.total_clicks, 1);
}

#[tokio::test]
async fn http_export_returns_csv_attachment() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let id = new_session(&client, &server.base_url).await;

    click(&client, &server.base_url, id).await;
    click(&client, &server.base_url, id).await;

    let response = client
        .get(format!("{}/api/sessions/{id}/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let headers = response.headers().clone();
    assert_eq!(headers["content-type"], "text/csv");
    let disposition = headers["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("filename=\"click_history_"));
    assert!(disposition.ends_with(".csv\""));

    let body = response.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Click Number,Timestamp");
    assert!(lines[1].starts_with("1,\""));
    assert!(lines[2].starts_with("2,\""));
}

#[tokio::test]
async fn http_unknown_session_is_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let id = new_session(&client, &server.base_url).await;

    let response = client
        .delete(format!("{}/api/sessions/{id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .post(format!("{}/api/sessions/{id}/click", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
