//! Per-request transaction context.

use std::collections::HashMap;
use std::fmt;

use crate::upload::UploadedFile;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::random();
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request parameters (query string and form body, already decoded).
pub type Parameters = HashMap<String, String>;

/// Files produced by multipart parsing, keyed by form field name.
pub type UploadedFiles = HashMap<String, UploadedFile>;

/// HTTP method as seen by a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    /// Any other method; pages never handle these.
    Other(String),
}

impl Method {
    /// Get the method name.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Other(name) => name,
        }
    }
}

impl From<&http::Method> for Method {
    fn from(method: &http::Method) -> Self {
        if method == http::Method::GET {
            Method::Get
        } else if method == http::Method::HEAD {
            Method::Head
        } else if method == http::Method::POST {
            Method::Post
        } else {
            Method::Other(method.as_str().to_string())
        }
    }
}

impl From<http::Method> for Method {
    fn from(method: http::Method) -> Self {
        Method::from(&method)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request facade handed to the page lifecycle.
///
/// Built by the transport layer; the lifecycle only reads from it.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Original request URI, including the query string.
    pub uri: String,
    /// Decoded request parameters.
    pub params: Parameters,
    /// Temporary files from a multipart body.
    pub files: UploadedFiles,
}

impl TransactionContext {
    /// Create a new transaction context.
    ///
    /// Parameters in the query string of `uri` are decoded into `params`.
    /// Parameters added later with [`with_param`](Self::with_param) replace
    /// query parameters of the same name.
    pub fn new(method: impl Into<Method>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let params = match uri.split_once('?') {
            Some((_, query)) => parse_query(query),
            None => HashMap::new(),
        };
        Self {
            request_id: RequestId::generate(),
            method: method.into(),
            uri,
            params,
            files: HashMap::new(),
        }
    }

    /// Add a request parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Attach an uploaded file.
    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    /// Get a request parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Check whether this is a POST request.
    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    /// Check whether this request is handled as a GET (GET or HEAD).
    pub fn is_get(&self) -> bool {
        matches!(self.method, Method::Get | Method::Head)
    }

    /// Request URI without the query string.
    pub fn path(&self) -> &str {
        strip_query(&self.uri)
    }
}

/// Decode an `application/x-www-form-urlencoded` query string.
///
/// The first occurrence of a repeated name wins. Pairs with an empty name
/// are skipped.
pub fn parse_query(query: &str) -> Parameters {
    let mut params = Parameters::new();
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key.is_empty() {
            continue;
        }
        params
            .entry(urlencoding_decode(key))
            .or_insert_with(|| urlencoding_decode(value));
    }
    params
}

/// Simple URL decoding; malformed escapes are kept as-is.
fn urlencoding_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        decoded.push(byte);
                        i += 2;
                    }
                    None => decoded.push(b'%'),
                }
            }
            other => decoded.push(other),
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Strip the query string from a URI.
pub fn strip_query(uri: &str) -> &str {
    match uri.find('?') {
        Some(i) => &uri[..i],
        None => uri,
    }
}
