//! Host-facing lifecycle contract and serve-result types.

use async_trait::async_trait;
use color_eyre::Result;

use crate::http::{Request, Response};

/// The three entry points a host delivers lifecycle events to.
///
/// Transitions are host-driven: install fires once per new controller
/// version, activate once after install, fetch repeatedly for the
/// controller's entire active lifetime.
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
  /// Populate the current-generation store with the app shell.
  async fn on_install(&self) -> Result<()>;

  /// Delete every store whose name is not the current generation.
  async fn on_activate(&self) -> Result<()>;

  /// Produce a response for an intercepted request.
  async fn on_fetch(&self, request: &Request) -> Result<Served>;
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
  /// Fresh response from the network
  Network,
  /// Exact-URL match in the current cache store
  Cache,
  /// The configured offline page, served in place of the requested one
  OfflinePage,
  /// Synthesized placeholder, built without network or storage
  Synthesized,
}

/// A response together with metadata about which path produced it.
#[derive(Debug, Clone)]
pub struct Served {
  pub response: Response,
  pub source: ServeSource,
}

impl Served {
  pub fn from_network(response: Response) -> Self {
    Self {
      response,
      source: ServeSource::Network,
    }
  }

  pub fn from_cache(response: Response) -> Self {
    Self {
      response,
      source: ServeSource::Cache,
    }
  }

  pub fn offline_page(response: Response) -> Self {
    Self {
      response,
      source: ServeSource::OfflinePage,
    }
  }

  pub fn synthesized(response: Response) -> Self {
    Self {
      response,
      source: ServeSource::Synthesized,
    }
  }
}
