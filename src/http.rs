//! Request and response value types used by the cache controller.
//!
//! Responses carry a fully materialized body rather than a stream, so a
//! single response can be handed to the caller and snapshotted into a cache
//! store without one read consuming the other.

/// How a request was issued, which decides the caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
  /// Full-document page load
  Navigate,
  /// Everything else: stylesheets, scripts, images, API calls
  Subresource,
}

/// An outgoing resource request intercepted by the controller.
///
/// The URL is kept as written (absolute or origin-relative); it doubles as
/// the cache key, so two spellings of the same resource are two entries.
#[derive(Debug, Clone)]
pub struct Request {
  pub url: String,
  pub mode: RequestMode,
}

impl Request {
  /// A full-page navigation request.
  pub fn navigate(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      mode: RequestMode::Navigate,
    }
  }

  /// A subresource request.
  pub fn subresource(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      mode: RequestMode::Subresource,
    }
  }

  pub fn is_navigation(&self) -> bool {
    self.mode == RequestMode::Navigate
  }
}

/// Origin classification of a response, as seen from the controller's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
  /// Same-origin response with a readable body
  Basic,
  /// Cross-origin response
  Cors,
  /// Cross-origin response whose body/status are not observable
  Opaque,
}

impl ResponseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ResponseKind::Basic => "basic",
      ResponseKind::Cors => "cors",
      ResponseKind::Opaque => "opaque",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "basic" => Some(ResponseKind::Basic),
      "cors" => Some(ResponseKind::Cors),
      "opaque" => Some(ResponseKind::Opaque),
      _ => None,
    }
  }
}

/// A complete response snapshot: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub kind: ResponseKind,
  /// Header name/value pairs in arrival order
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn new(status: u16, kind: ResponseKind) -> Self {
    Self {
      status,
      kind,
      headers: Vec::new(),
      body: Vec::new(),
    }
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
    self.body = body.into();
    self
  }

  /// First header value matching `name`, case-insensitive.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  pub fn is_ok(&self) -> bool {
    self.status == 200
  }

  /// Whether this response may be written to a cache store.
  ///
  /// Only successful same-origin responses qualify; opaque or error
  /// responses would poison the cache with content we can't vouch for.
  pub fn is_cacheable(&self) -> bool {
    self.status == 200 && self.kind == ResponseKind::Basic
  }

  /// The terminal fallback for an offline navigation: a synthesized HTML
  /// page built without touching network or storage. This constructor
  /// cannot fail.
  pub fn offline_placeholder() -> Self {
    Response::new(200, ResponseKind::Basic)
      .with_header("Content-Type", "text/html")
      .with_body("<h1>Offline</h1><p>You are not connected and this page is not available offline.</p>")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clone_keeps_body_readable() {
    let response = Response::new(200, ResponseKind::Basic).with_body("hello");
    let snapshot = response.clone();

    // Both copies must observe the full body
    assert_eq!(response.body, b"hello");
    assert_eq!(snapshot.body, b"hello");
  }

  #[test]
  fn test_cacheable_requires_basic_200() {
    assert!(Response::new(200, ResponseKind::Basic).is_cacheable());
    assert!(!Response::new(200, ResponseKind::Cors).is_cacheable());
    assert!(!Response::new(200, ResponseKind::Opaque).is_cacheable());
    assert!(!Response::new(404, ResponseKind::Basic).is_cacheable());
    assert!(!Response::new(301, ResponseKind::Basic).is_cacheable());
  }

  #[test]
  fn test_header_lookup_is_case_insensitive() {
    let response = Response::new(200, ResponseKind::Basic).with_header("Content-Type", "text/css");
    assert_eq!(response.header("content-type"), Some("text/css"));
    assert_eq!(response.header("X-Missing"), None);
  }

  #[test]
  fn test_offline_placeholder_is_html_and_mentions_offline() {
    let response = Response::offline_placeholder();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("text/html"));
    assert!(String::from_utf8_lossy(&response.body).contains("Offline"));
  }
}
