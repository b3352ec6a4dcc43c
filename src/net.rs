//! Network fetch primitive.
//!
//! The controller only sees the [`Fetch`] trait; tests substitute a scripted
//! implementation, the CLI wires in [`HttpFetcher`].

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::http::{Request, Response, ResponseKind};

/// Trait for the host network primitive: request in, response or failure out.
///
/// A returned error means the fetch itself failed (offline, DNS, refused);
/// HTTP error statuses come back as `Ok` responses, mirroring how the host
/// fetch primitive behaves.
#[async_trait]
pub trait Fetch: Send + Sync {
  async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// HTTP fetcher scoped to an origin.
///
/// Request URLs are resolved against the origin, so the controller can work
/// with origin-relative URLs the way pages issue them. Responses from the
/// same origin are classified `Basic`, everything else `Cors`.
pub struct HttpFetcher {
  client: reqwest::Client,
  origin: Url,
}

impl HttpFetcher {
  pub fn new(origin: Url) -> Result<Self> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { client, origin })
  }

  fn resolve(&self, url: &str) -> Result<Url> {
    self
      .origin
      .join(url)
      .map_err(|e| eyre!("Invalid request URL {}: {}", url, e))
  }
}

#[async_trait]
impl Fetch for HttpFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let target = self.resolve(&request.url)?;

    let response = self
      .client
      .get(target.clone())
      .send()
      .await
      .map_err(|e| eyre!("Fetch failed for {}: {}", request.url, e))?;

    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.to_string(), v.to_string()))
      })
      .collect();

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", request.url, e))?
      .to_vec();

    let kind = if target.origin() == self.origin.origin() {
      ResponseKind::Basic
    } else {
      ResponseKind::Cors
    };

    Ok(Response {
      status,
      kind,
      headers,
      body,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resolve_relative_against_origin() {
    let fetcher = HttpFetcher::new(Url::parse("https://shop.example.com").unwrap()).unwrap();
    let target = fetcher.resolve("/static/css/estilo.css").unwrap();
    assert_eq!(
      target.as_str(),
      "https://shop.example.com/static/css/estilo.css"
    );
  }

  #[test]
  fn test_resolve_keeps_absolute_urls() {
    let fetcher = HttpFetcher::new(Url::parse("https://shop.example.com").unwrap()).unwrap();
    let target = fetcher
      .resolve("https://cdnjs.cloudflare.com/ajax/libs/moment.js/2.29.4/moment.min.js")
      .unwrap();
    assert_eq!(target.host_str(), Some("cdnjs.cloudflare.com"));
  }
}
