//! Throwaway HTTP endpoint serving one canned response per route.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub body: String,
}

pub fn canned(status: u16, body: &str) -> Canned {
    Canned {
        status,
        body: body.to_string(),
    }
}

/// Every request seen: request line followed by its header lines.
pub type Seen = Arc<Mutex<Vec<Vec<String>>>>;

/// Serve `routes` until the test runtime ends. A route key matches the full
/// request target first, then the bare path.
/// Unknown paths get a 404. Returns the base URL and the request log.
pub async fn spawn(routes: Vec<(&str, Canned)>) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let routes: HashMap<String, Canned> = routes.into_iter().map(|(p, c)| (p.to_string(), c)).collect();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(s) => s,
                Err(_) => return,
            };
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut request = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.is_empty() {
                    break;
                }
                request.push(line);
            }
            let target = request
                .first()
                .and_then(|l| l.split_whitespace().nth(1))
                .unwrap_or("")
                .to_string();
            let path = target.split('?').next().unwrap_or("").to_string();
            log.lock().unwrap().push(request);

            let resp = routes
                .get(&target)
                .or_else(|| routes.get(&path))
                .cloned()
                .unwrap_or_else(|| canned(404, "not found"));
            let raw = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
                resp.status,
                resp.body.len(),
                resp.body
            );
            let _ = write.write_all(raw.as_bytes()).await;
            let _ = write.shutdown().await;
        }
    });

    (format!("http://{}", addr), seen)
}
