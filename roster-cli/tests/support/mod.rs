//! Loopback stand-in for the token, directory, and People endpoints.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PRIVATE_KEY_PEM: &str = include_str!("../../../roster-google/tests/fixtures/test-key.pem");

/// `(method, path)` of each request, in arrival order.
pub type Seen = Arc<Mutex<Vec<(String, String)>>>;

/// Serves one canned JSON body per request, in order.
pub fn serve(replies: Vec<(u16, serde_json::Value)>) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
    let seen: Seen = Arc::default();
    let log = Arc::clone(&seen);

    std::thread::spawn(move || {
        for (status, body) in replies {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            stream.set_read_timeout(Some(Duration::from_secs(5))).ok();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                return;
            }
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let target = parts.next().unwrap_or_default();
            let path = target.split('?').next().unwrap_or_default().to_string();

            let mut length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).is_err() || line.trim_end().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut discard = vec![0u8; length];
            reader.read_exact(&mut discard).ok();
            log.lock().unwrap().push((method, path));

            let body = body.to_string();
            let response = format!(
                "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).ok();
        }
    });

    (base_url, seen)
}

/// Write a service-account key pointing its token endpoint at `base_url`.
pub fn write_key(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("service-account.json");
    let key = serde_json::json!({
        "type": "service_account",
        "project_id": "roster-test",
        "private_key_id": "kid-1",
        "private_key": PRIVATE_KEY_PEM,
        "client_email": "sync@roster-test.iam.gserviceaccount.com",
        "token_uri": format!("{base_url}/token"),
    });
    std::fs::write(&path, key.to_string()).expect("write key");
    path
}

/// Config wired to the loopback server with instant retries.
pub fn write_config(dir: &Path, key: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    let yaml = format!(
        "service_account_key: {}\n\
         admin_email: admin@example.com\n\
         retry:\n  max_attempts: 2\n  base_delay_ms: 1\n  max_jitter_ms: 0\n\
         http:\n  timeout_seconds: 5\n  directory_base_url: {base_url}\n  people_base_url: {base_url}\n",
        key.display()
    );
    std::fs::write(&path, yaml).expect("write config");
    path
}

pub fn token(value: &str) -> (u16, serde_json::Value) {
    (200, serde_json::json!({"access_token": value, "expires_in": 3600}))
}
