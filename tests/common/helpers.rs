#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use httpseek::{Error, Result, RetryingReader, Seeker, Transport};
use reqwest::header::{
    HeaderName, AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE,
};
use reqwest::{Body, Method, Request, Response, ResponseBuilderExt, StatusCode, Url};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// Common test constants
pub const HELLO: &[u8] = b"Hello World!";
pub const TEST_URL: &str = "http://files.test/hello.txt";

/// Installs a tracing subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How the fake server answers `Range` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// 206 with a correct `Content-Range`.
    Honest,
    /// 200 with the whole resource.
    IgnoreRange,
    /// 206 whose `Content-Range` always starts at 0.
    WrongStart,
    /// 206 with `Content-Range: bytes a-b/*`.
    UnknownTotal,
    /// 206 without a `Content-Range` header.
    MissingHeader,
}

/// What goes wrong with the body of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The body errors after this many bytes.
    ErrorAfter(usize),
    /// The body ends cleanly after this many bytes.
    TruncateAfter(usize),
}

/// A request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct Logged {
    pub method: Method,
    pub host: String,
    pub path: String,
    pub range: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Debug)]
struct State {
    content: Vec<u8>,
    mode: RangeMode,
    chunked: bool,
    refuse_connections: usize,
    faults: VecDeque<Option<Fault>>,
    redirects: Vec<(String, Option<String>)>,
    not_found: Vec<String>,
    no_content: Vec<String>,
    log: Vec<Logged>,
}

/// An in-memory server implementing [`Transport`].
#[derive(Debug)]
pub struct FakeServer {
    state: Mutex<State>,
}

impl FakeServer {
    pub fn new(content: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                content: content.to_vec(),
                mode: RangeMode::Honest,
                chunked: false,
                refuse_connections: 0,
                faults: VecDeque::new(),
                redirects: Vec::new(),
                not_found: Vec::new(),
                no_content: Vec::new(),
                log: Vec::new(),
            }),
        })
    }

    pub fn hello() -> Arc<Self> {
        Self::new(HELLO)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake server state poisoned")
    }

    pub fn set_mode(&self, mode: RangeMode) {
        self.state().mode = mode;
    }

    /// Omit `Content-Length`, so only `Content-Range` can reveal the size.
    pub fn set_chunked(&self, chunked: bool) {
        self.state().chunked = chunked;
    }

    pub fn set_content(&self, content: &[u8]) {
        self.state().content = content.to_vec();
    }

    /// The next `count` requests fail before any response arrives.
    pub fn refuse_connections(&self, count: usize) {
        self.state().refuse_connections = count;
    }

    /// Body faults for the next responses, in order.
    pub fn push_faults(&self, faults: impl IntoIterator<Item = Option<Fault>>) {
        self.state().faults.extend(faults);
    }

    /// Answer `path` with a 302, pointing at `location` if given.
    pub fn redirect(&self, path: &str, location: Option<&str>) {
        self.state()
            .redirects
            .push((path.to_string(), location.map(str::to_string)));
    }

    pub fn not_found(&self, path: &str) {
        self.state().not_found.push(path.to_string());
    }

    /// Answer `path` with an empty 204.
    pub fn no_content(&self, path: &str) {
        self.state().no_content.push(path.to_string());
    }

    pub fn requests(&self) -> Vec<Logged> {
        self.state().log.clone()
    }

    pub fn ranges(&self) -> Vec<Option<String>> {
        self.state().log.iter().map(|l| l.range.clone()).collect()
    }

    fn respond(&self, request: &Request) -> Result<Response> {
        let mut state = self.state();
        let header = |name: HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let range = header(RANGE);
        let url = request.url().clone();
        let path = url.path().to_string();
        state.log.push(Logged {
            method: request.method().clone(),
            host: request.url().host_str().unwrap_or_default().to_string(),
            path: path.clone(),
            range: range.clone(),
            authorization: header(AUTHORIZATION),
        });

        if state.refuse_connections > 0 {
            state.refuse_connections -= 1;
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into());
        }

        if let Some((_, location)) = state.redirects.iter().find(|(p, _)| *p == path) {
            let mut builder = response_for(&url).status(StatusCode::FOUND);
            if let Some(location) = location {
                builder = builder.header(LOCATION, location.as_str());
            }
            return Ok(builder.body(Body::from("moved")).unwrap().into());
        }

        if state.not_found.contains(&path) {
            return Ok(response_for(&url)
                .status(StatusCode::NOT_FOUND)
                .body(Body::from("not found"))
                .unwrap()
                .into());
        }

        if state.no_content.contains(&path) {
            return Ok(response_for(&url)
                .status(StatusCode::NO_CONTENT)
                .body(Body::from(Vec::new()))
                .unwrap()
                .into());
        }

        let len = state.content.len() as u64;
        let offset = range.as_deref().map(parse_range).unwrap_or(0);
        let fault = state.faults.pop_front().flatten();

        let ranged = range.is_some() && state.mode != RangeMode::IgnoreRange;
        if !ranged {
            let body = state.content.clone();
            return Ok(build(&url, StatusCode::OK, None, body, state.chunked, fault));
        }

        if offset >= len {
            return Ok(response_for(&url)
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(CONTENT_RANGE, format!("bytes */{}", len))
                .body(Body::from(Vec::new()))
                .unwrap()
                .into());
        }

        let (start, body) = match state.mode {
            RangeMode::WrongStart => (0, state.content.clone()),
            _ => (offset, state.content[offset as usize..].to_vec()),
        };
        let content_range = match state.mode {
            RangeMode::MissingHeader => None,
            RangeMode::UnknownTotal => Some(format!("bytes {}-{}/*", start, len - 1)),
            _ => Some(format!("bytes {}-{}/{}", start, len - 1, len)),
        };
        Ok(build(
            &url,
            StatusCode::PARTIAL_CONTENT,
            content_range,
            body,
            state.chunked,
            fault,
        ))
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.respond(&request)
    }
}

fn parse_range(value: &str) -> u64 {
    value
        .strip_prefix("bytes=")
        .and_then(|r| r.strip_suffix('-'))
        .and_then(|r| r.parse().ok())
        .expect("fake server only understands open-ended ranges")
}

/// A response builder that reports `url` as the response URL.
fn response_for(url: &Url) -> http::response::Builder {
    http::Response::builder().url(url.clone())
}

fn build(
    url: &Url,
    status: StatusCode,
    content_range: Option<String>,
    body: Vec<u8>,
    chunked: bool,
    fault: Option<Fault>,
) -> Response {
    let mut builder = response_for(url).status(status);
    if !chunked {
        builder = builder.header(CONTENT_LENGTH, body.len().to_string());
    }
    if let Some(content_range) = content_range {
        builder = builder.header(CONTENT_RANGE, content_range);
    }

    let body = match fault {
        None if chunked => Body::wrap_stream(stream::iter(vec![Ok::<_, io::Error>(
            Bytes::from(body),
        )])),
        None => Body::from(body),
        Some(Fault::TruncateAfter(n)) => {
            let n = n.min(body.len());
            Body::wrap_stream(stream::iter(vec![Ok::<_, io::Error>(Bytes::copy_from_slice(
                &body[..n],
            ))]))
        }
        Some(Fault::ErrorAfter(n)) => {
            let n = n.min(body.len());
            Body::wrap_stream(stream::iter(vec![
                Ok(Bytes::copy_from_slice(&body[..n])),
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "intentional error")),
            ]))
        }
    };
    builder.body(body).unwrap().into()
}

/// A GET request template for `path` on the fake host.
pub fn get(path: &str) -> Request {
    let url = Url::parse(TEST_URL).unwrap().join(path).unwrap();
    Request::new(Method::GET, url)
}

/// Reads a seeker to the end in 4-byte steps.
pub async fn read_all<T: Transport>(seeker: &mut Seeker<T>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4];
    loop {
        let n = seeker.read(&mut buf).await?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

/// Reads a retrying reader to the end in 4-byte steps.
pub async fn read_all_retrying<T: Transport>(reader: &mut RetryingReader<T>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

/// Asserts that an error is the byte-range sentinel.
pub fn assert_range_not_honored(error: &Error) {
    assert!(
        error.is_byte_range_violation(),
        "expected the byte-range sentinel, got {error:?}"
    );
}
