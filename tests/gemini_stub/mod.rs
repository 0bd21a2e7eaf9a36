use std::io::Read as _;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Local stand-in for the Gemini `generateContent` endpoint. Every request
/// gets the same scripted status and body.
pub struct GeminiStub {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl GeminiStub {
    /// Replies 200 with `text` wrapped in a candidate envelope.
    pub fn replying_text(text: &str) -> Self {
        let envelope = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        });
        Self::spawn(200, envelope.to_string())
    }

    /// Replies with a Gemini-style error envelope.
    pub fn failing(status: u16, message: &str) -> Self {
        let envelope = serde_json::json!({
            "error": { "code": status, "message": message, "status": "ERROR" }
        });
        Self::spawn(status, envelope.to_string())
    }

    pub fn spawn(status: u16, body: String) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start gemini stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1beta");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };

            let api_key = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("x-goog-api-key"))
                .map(|h| h.value.as_str().to_owned());
            let mut raw = String::new();
            let _ = request.as_reader().read_to_string(&mut raw);
            recorded.lock().unwrap().push(RecordedRequest {
                path: request.url().to_string(),
                api_key,
                body: serde_json::from_str(&raw).unwrap_or(Value::Null),
            });

            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .expect("build header");
            let response = tiny_http::Response::from_string(body.clone())
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for GeminiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
