//! Scripted loopback HTTP server and fixtures for exercising the clients
//! against real sockets.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use roster_core::{EmailAddress, RetryPolicy, ScopedCredential, Sleeper};

pub const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/test-key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test-key.pub.pem");
pub const SERVICE_ACCOUNT: &str = "sync@roster-test.iam.gserviceaccount.com";

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        Self::json(200, body)
    }

    pub fn unavailable() -> Self {
        Self::json(
            503,
            serde_json::json!({"error": {"code": 503, "message": "Backend Error", "status": "UNAVAILABLE"}}),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path including the query string, as sent.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or(&self.target)
    }

    /// Raw value of a query parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        let (_, query) = self.target.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Answers one request per scripted reply, in order, then stops listening.
pub struct ScriptedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl ScriptedServer {
    pub fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        std::thread::spawn(move || {
            for reply in replies {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                serve(stream, &reply, &recorded);
            }
        });

        Self { base_url, requests }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

// Records the request before replying so callers see it once their call returns.
fn serve(stream: TcpStream, reply: &Reply, recorded: &Mutex<Vec<Recorded>>) -> Option<()> {
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok()?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;
    recorded.lock().unwrap().push(Recorded {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let response = format!(
        "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn key_json(token_uri: &str) -> String {
    serde_json::json!({
        "type": "service_account",
        "project_id": "roster-test",
        "private_key_id": "kid-1",
        "private_key": PRIVATE_KEY_PEM,
        "client_email": SERVICE_ACCOUNT,
        "token_uri": token_uri,
    })
    .to_string()
}

pub fn credential(subject: &str) -> ScopedCredential {
    ScopedCredential {
        subject: EmailAddress::from(subject),
        access_token: "ya29.test".to_string(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

pub fn quick_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_jitter: Duration::ZERO,
    }
}

/// Skips backoff waits.
pub struct NoSleep;

impl NoSleep {
    pub fn boxed() -> Box<dyn Sleeper> {
        Box::new(NoSleep)
    }
}

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}
