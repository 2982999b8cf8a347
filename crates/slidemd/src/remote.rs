//! External collaborators: the key/value hash store that backs short share
//! links, and the place static documents are loaded from.
//!
//! Every call is attempted exactly once; failures are returned to the caller,
//! which decides on the fallback.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("unexpected response from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} not found")]
    Missing(String),
}

impl FetchError {
    fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => Self::Status {
                url: url.to_string(),
                status,
            },
            source => Self::Network {
                url: url.to_string(),
                source,
            },
        }
    }
}

/// `GET url` and return the body as text.
pub fn fetch_text(url: &str) -> Result<String, FetchError> {
    tracing::debug!(%url, "GET");
    ureq::get(url)
        .call()
        .map_err(|e| FetchError::from_ureq(url, e))?
        .body_mut()
        .read_to_string()
        .map_err(|e| FetchError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Read `{dir}/{file}`, refusing names that would leave `dir`.
pub fn read_in_dir(dir: &Path, file: &str) -> Result<String, FetchError> {
    if !is_plain_name(file) {
        return Err(FetchError::Missing(file.to_string()));
    }
    let path = dir.join(file);
    std::fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            FetchError::Missing(path.display().to_string())
        } else {
            FetchError::Io { path, source }
        }
    })
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

/// Short-key storage for share tokens.
pub trait HashStore: Send + Sync {
    /// Store a token and return the key it can be fetched by.
    fn add(&self, token: &str) -> Result<String, FetchError>;

    /// Fetch the token stored under `key`.
    fn get(&self, key: &str) -> Result<String, FetchError>;
}

#[derive(Serialize, Deserialize)]
struct HashBody {
    #[serde(default)]
    hash: Option<String>,
}

#[derive(Deserialize)]
struct KeyBody {
    #[serde(default)]
    key: Option<String>,
}

/// Hash store speaking `POST {base}/add` and `GET {base}/{key}` with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpHashStore {
    base_url: String,
}

impl HttpHashStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl HashStore for HttpHashStore {
    fn add(&self, token: &str) -> Result<String, FetchError> {
        let url = format!("{}/add", self.base_url);
        tracing::debug!(%url, "POST");
        let body = HashBody {
            hash: Some(token.to_string()),
        };
        let response: KeyBody = ureq::post(&url)
            .header("accept", "application/json")
            .send_json(&body)
            .map_err(|e| FetchError::from_ureq(&url, e))?
            .body_mut()
            .read_json()
            .map_err(|e| FetchError::Body {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        response
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FetchError::Body {
                url,
                reason: "response has no key".to_string(),
            })
    }

    fn get(&self, key: &str) -> Result<String, FetchError> {
        let url = format!("{}/{key}", self.base_url);
        tracing::debug!(%url, "GET");
        let response: HashBody = ureq::get(&url)
            .header("accept", "application/json")
            .call()
            .map_err(|e| FetchError::from_ureq(&url, e))?
            .body_mut()
            .read_json()
            .map_err(|e| FetchError::Body {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        response
            .hash
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FetchError::Missing(format!("key {key}")))
    }
}

/// Where static documents (the built-in info page, `--file` loads) come from.
pub trait StaticSource: Send + Sync {
    fn load(&self, name: &str) -> Result<String, FetchError>;
}

/// Static documents served next to the viewer: `GET {origin}/{name}`.
#[derive(Debug, Clone)]
pub struct HttpStatic {
    origin: String,
}

impl HttpStatic {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

impl StaticSource for HttpStatic {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        fetch_text(&format!("{}/{name}", self.origin))
    }
}

/// Static documents from a local directory.
#[derive(Debug, Clone)]
pub struct DirStatic {
    dir: PathBuf,
}

impl DirStatic {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl StaticSource for DirStatic {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        read_in_dir(&self.dir, name)
    }
}

/// The info document compiled into the binary, used when nothing else is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStatic;

pub const INFO_DOCUMENT: &str = include_str!("../docs/info.md");

impl StaticSource for BuiltinStatic {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        match name {
            crate::session::INFO_DOCUMENT_NAME => Ok(INFO_DOCUMENT.to_string()),
            _ => Err(FetchError::Missing(name.to_string())),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn test_plain_names() {
        assert!(is_plain_name("info.md"));
        assert!(!is_plain_name("../secret"));
        assert!(!is_plain_name("a/b.md"));
        assert!(!is_plain_name(".hidden"));
        assert!(!is_plain_name(""));
    }

    #[test]
    fn test_dir_static_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("info.md"), "# Info").unwrap();
        let source = DirStatic::new(dir.path());
        assert_eq!(source.load("info.md").unwrap(), "# Info");
        assert!(matches!(source.load("nope.md"), Err(FetchError::Missing(_))));
        assert!(matches!(source.load("../info.md"), Err(FetchError::Missing(_))));
    }

    #[test]
    fn test_builtin_static() {
        let doc = BuiltinStatic.load(crate::session::INFO_DOCUMENT_NAME).unwrap();
        assert!(!doc.is_empty());
        assert!(BuiltinStatic.load("other.md").is_err());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        let key = store.add("token").unwrap();
        assert_eq!(store.get(&key).unwrap(), "token");
        assert!(store.get("missing").is_err());
    }

    #[test]
    fn test_http_store_trims_base() {
        let store = HttpHashStore::new("https://hash.example.org/");
        assert_eq!(store.base_url, "https://hash.example.org");
    }

    /// Serve one request on a local port, answering `status` with a JSON
    /// `body`. The handle yields the request line and request body.
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut length = 0;
            let mut chunked = false;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                match line.split_once(':') {
                    Some((name, value)) if name.eq_ignore_ascii_case("content-length") => {
                        length = value.trim().parse().unwrap();
                    }
                    Some((name, value)) if name.eq_ignore_ascii_case("transfer-encoding") => {
                        chunked = value.trim().eq_ignore_ascii_case("chunked");
                    }
                    _ => {}
                }
            }
            let mut request_body = Vec::new();
            if chunked {
                loop {
                    let mut size = String::new();
                    reader.read_line(&mut size).unwrap();
                    let size = usize::from_str_radix(size.trim(), 16).unwrap();
                    let mut chunk = vec![0; size + 2];
                    reader.read_exact(&mut chunk).unwrap();
                    if size == 0 {
                        break;
                    }
                    request_body.extend_from_slice(&chunk[..size]);
                }
            } else {
                request_body.resize(length, 0);
                reader.read_exact(&mut request_body).unwrap();
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
            (
                request_line.trim_end().to_string(),
                String::from_utf8(request_body).unwrap(),
            )
        });
        (base, handle)
    }

    #[test]
    fn test_http_store_add_posts_token() {
        let (base, server) = serve_once(200, r#"{"key":"k42"}"#);
        let key = HttpHashStore::new(base).add("TOKEN").unwrap();
        assert_eq!(key, "k42");
        let (request_line, body) = server.join().unwrap();
        assert!(request_line.starts_with("POST /api/add "));
        assert_eq!(body, r#"{"hash":"TOKEN"}"#);
    }

    #[test]
    fn test_http_store_get_reads_hash() {
        let (base, server) = serve_once(200, r#"{"hash":"TOKEN"}"#);
        assert_eq!(HttpHashStore::new(base).get("k42").unwrap(), "TOKEN");
        let (request_line, _) = server.join().unwrap();
        assert!(request_line.starts_with("GET /api/k42 "));
    }

    #[test]
    fn test_http_store_missing_hash() {
        let (base, server) = serve_once(200, "{}");
        let err = HttpHashStore::new(base).get("k42").unwrap_err();
        assert!(matches!(err, FetchError::Missing(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_http_store_error_status() {
        let (base, server) = serve_once(503, "{}");
        let err = HttpHashStore::new(base).add("TOKEN").unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_hash_body_serializes() {
        let body = HashBody {
            hash: Some("abc".to_string()),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"hash":"abc"}"#);
        let parsed: KeyBody = serde_json::from_str(r#"{"key":"x1"}"#).unwrap();
        assert_eq!(parsed.key.as_deref(), Some("x1"));
    }
}
