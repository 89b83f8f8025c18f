#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use ntfy_client::{Client, Config};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        ntfy_client::logging::init_logging_with_level("debug");
    });
}

pub fn test_config(server: &TestServer, reconnect_delay: Duration) -> Config {
    Config {
        default_host: server.base_url.clone(),
        reconnect_delay_ms: reconnect_delay.as_millis() as u64,
        ..Config::default()
    }
}

/// Client for `config` without proxy lookup.
pub fn client_for(config: Config) -> Client {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("failed to build http client");
    Client::with_http(config, http)
}

/// Client against `server` with a short reconnect delay.
pub fn test_client(server: &TestServer, reconnect_delay: Duration) -> Client {
    client_for(test_config(server, reconnect_delay))
}

pub fn message_line(id: &str, topic: &str, body: &str) -> String {
    format!(r#"{{"id":"{id}","time":1700000000,"event":"message","topic":"{topic}","message":"{body}"}}"#)
}

pub fn open_line(topic: &str) -> String {
    format!(r#"{{"id":"o1","time":1700000000,"event":"open","topic":"{topic}"}}"#)
}

pub fn keepalive_line(topic: &str) -> String {
    format!(r#"{{"id":"k1","time":1700000000,"event":"keepalive","topic":"{topic}"}}"#)
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub at: Instant,
}

impl Request {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        let (_, query) = self.target.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Scripted server reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Complete response with a fixed body.
    Body { status: u16, body: String },
    /// Chunked 200 response, one JSON line per chunk. With `hold_open` the
    /// connection stays open after the last line until the client hangs up.
    Stream {
        lines: Vec<String>,
        interval: Duration,
        hold_open: bool,
    },
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Reply::Body {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Body {
            status,
            body: body.into(),
        }
    }

    pub fn closing(lines: Vec<String>) -> Self {
        Reply::Stream {
            lines,
            interval: Duration::ZERO,
            hold_open: false,
        }
    }

    pub fn open(lines: Vec<String>) -> Self {
        Reply::Stream {
            lines,
            interval: Duration::ZERO,
            hold_open: true,
        }
    }
}

type Handler = dyn Fn(&Request, usize) -> Reply + Send + Sync;

/// Minimal HTTP/1.1 server on an ephemeral port.
///
/// Every connection serves exactly one request. The handler gets the request
/// and how many earlier requests hit the same path.
pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Request>>>,
    hangups: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Request, usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral failed");
        let addr = listener.local_addr().expect("no local addr");
        let requests: Arc<Mutex<Vec<Request>>> = Arc::default();
        let hangups = Arc::new(AtomicUsize::new(0));
        let handler: Arc<Handler> = Arc::new(handler);

        let (reqs, hups) = (requests.clone(), hangups.clone());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (handler, reqs, hups) = (handler.clone(), reqs.clone(), hups.clone());
                tokio::spawn(async move {
                    let _ = serve_connection(stream, handler, reqs, hups).await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
            hangups,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }

    /// Held-open streams whose client went away.
    pub fn hangups(&self) -> usize {
        self.hangups.load(Ordering::SeqCst)
    }

    /// Polls until `n` requests hit `path`, or panics after `within`.
    pub async fn wait_for_requests(&self, path: &str, n: usize, within: Duration) {
        let deadline = Instant::now() + within;
        while self.requests_to(path).len() < n {
            assert!(
                Instant::now() < deadline,
                "expected {n} requests to {path}, saw {}",
                self.requests_to(path).len()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<Request>>>,
    hangups: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let Some(request) = read_request(&mut reader).await? else {
        return Ok(());
    };

    let attempt = {
        let mut all = requests.lock().unwrap();
        let attempt = all.iter().filter(|r| r.path() == request.path()).count();
        all.push(request.clone());
        attempt
    };

    match handler(&request, attempt) {
        Reply::Body { status, body } => {
            let head = format!(
                "HTTP/1.1 {status} Reply\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            writer.write_all(head.as_bytes()).await?;
            writer.write_all(body.as_bytes()).await?;
            writer.shutdown().await?;
        }
        Reply::Stream {
            lines,
            interval,
            hold_open,
        } => {
            writer
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                )
                .await?;
            writer.flush().await?;
            for line in lines {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                let chunk = format!("{line}\n");
                writer
                    .write_all(format!("{:x}\r\n{chunk}\r\n", chunk.len()).as_bytes())
                    .await?;
                writer.flush().await?;
            }
            if hold_open {
                let mut rest = Vec::new();
                let _ = reader.read_to_end(&mut rest).await;
                hangups.fetch_add(1, Ordering::SeqCst);
            } else {
                writer.write_all(b"0\r\n\r\n").await?;
                writer.shutdown().await?;
            }
        }
    }
    Ok(())
}

async fn read_request(reader: &mut BufReader<OwnedReadHalf>) -> std::io::Result<Option<Request>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let at = Instant::now();
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let header = line.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let find = |name: &str| {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    };

    let mut body = Vec::new();
    if let Some(len) = find("content-length").and_then(|v| v.parse::<usize>().ok()) {
        body.resize(len, 0);
        reader.read_exact(&mut body).await?;
    } else if find("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        loop {
            line.clear();
            reader.read_line(&mut line).await?;
            let size = usize::from_str_radix(line.trim(), 16).unwrap_or(0);
            if size == 0 {
                line.clear();
                reader.read_line(&mut line).await?;
                break;
            }
            let mut chunk = vec![0u8; size + 2];
            reader.read_exact(&mut chunk).await?;
            body.extend_from_slice(&chunk[..size]);
        }
    }

    Ok(Some(Request {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
        at,
    }))
}
