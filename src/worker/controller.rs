//! The cache controller: install/activate/fetch over injected store and
//! network dependencies.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::traits::{LifecycleHandler, Served};
use crate::config::{Config, InstallPolicy};
use crate::http::{Request, RequestMode, Response};
use crate::net::Fetch;
use crate::store::CacheStores;

/// Offline cache controller for one cache generation.
///
/// Keeps exactly one generation's store alive and decides per request
/// whether to serve from the store or the network. All state lives in the
/// injected store backend; the controller itself is stateless between
/// events.
pub struct CacheController<S: CacheStores, F: Fetch> {
  stores: Arc<S>,
  fetcher: F,
  cache_name: String,
  app_shell: Vec<String>,
  offline_page: Option<String>,
  install_policy: InstallPolicy,
}

impl<S: CacheStores, F: Fetch> CacheController<S, F> {
  pub fn new(stores: S, fetcher: F, config: &Config) -> Self {
    Self {
      stores: Arc::new(stores),
      fetcher,
      cache_name: config.cache_name.clone(),
      app_shell: config.app_shell.clone(),
      offline_page: config.offline_page.clone(),
      install_policy: config.install_policy,
    }
  }

  /// The injected store backend.
  pub fn stores(&self) -> &S {
    &self.stores
  }

  /// Install phase: open the current-generation store and populate it with
  /// the app shell as one all-or-nothing batch.
  ///
  /// A failed batch leaves the store as it was. Under the default
  /// `FailOpen` policy the failure is logged and install still succeeds;
  /// under `FailClosed` it is returned, so a host can refuse to activate
  /// an incomplete generation.
  pub async fn install(&self) -> Result<()> {
    info!(generation = %self.cache_name, "installing cache controller");
    self.stores.open(&self.cache_name)?;

    match self.populate_shell().await {
      Ok(count) => {
        info!(entries = count, "app shell cached");
        Ok(())
      }
      Err(err) => {
        error!("failed to cache app shell: {err:#}");
        match self.install_policy {
          InstallPolicy::FailOpen => Ok(()),
          InstallPolicy::FailClosed => Err(err),
        }
      }
    }
  }

  /// Fetch every shell URL, then write them all. Nothing is written unless
  /// every fetch came back 200, matching the all-or-nothing batch contract.
  async fn populate_shell(&self) -> Result<usize> {
    let fetches = self.app_shell.iter().map(|url| async move {
      let response = self.fetcher.fetch(&Request::subresource(url.clone())).await?;
      if !response.is_ok() {
        return Err(eyre!("{} returned status {}", url, response.status));
      }
      Ok((url.as_str(), response))
    });

    let responses = try_join_all(fetches).await?;
    for (url, response) in &responses {
      self.stores.put(&self.cache_name, url, response)?;
    }

    Ok(responses.len())
  }

  /// Activate phase: delete every store whose name differs from the
  /// current generation identifier.
  pub async fn activate(&self) -> Result<()> {
    info!(generation = %self.cache_name, "activating cache controller");

    for name in self.stores.names()? {
      if name != self.cache_name {
        info!(store = %name, "removing stale cache store");
        self.stores.delete(&name)?;
      }
    }

    Ok(())
  }

  /// Fetch phase: route by request mode.
  pub async fn handle_fetch(&self, request: &Request) -> Result<Served> {
    match request.mode {
      RequestMode::Navigate => self.network_first(request).await,
      RequestMode::Subresource => self.cache_first(request).await,
    }
  }

  /// Network-first with a three-level offline fallback:
  /// exact cache match, then the configured offline page, then a
  /// synthesized placeholder that needs no I/O at all.
  async fn network_first(&self, request: &Request) -> Result<Served> {
    match self.fetcher.fetch(request).await {
      Ok(response) => {
        if response.is_ok() {
          // Snapshot for offline fallback; must not block the response
          if let Err(err) = self.stores.put(&self.cache_name, &request.url, &response) {
            warn!(url = %request.url, "failed to cache navigation response: {err:#}");
          }
        }
        Ok(Served::from_network(response))
      }
      Err(err) => {
        warn!(url = %request.url, "navigation fetch failed, falling back to cache: {err:#}");

        if let Some(cached) = self.stores.get(&self.cache_name, &request.url)? {
          return Ok(Served::from_cache(cached.response));
        }

        if let Some(page) = &self.offline_page {
          if let Some(cached) = self.stores.get(&self.cache_name, page)? {
            info!(url = %request.url, "serving offline page");
            return Ok(Served::offline_page(cached.response));
          }
        }

        Ok(Served::synthesized(Response::offline_placeholder()))
      }
    }
  }

  /// Cache-first: an exact match short-circuits the network entirely; on a
  /// miss the network response is returned and, when it is a same-origin
  /// 200, opportunistically cached. A failed network fetch propagates.
  async fn cache_first(&self, request: &Request) -> Result<Served> {
    if let Some(cached) = self.stores.get(&self.cache_name, &request.url)? {
      return Ok(Served::from_cache(cached.response));
    }

    debug!(url = %request.url, "cache miss, going to network");
    let response = self.fetcher.fetch(request).await?;

    if response.is_cacheable() {
      if let Err(err) = self.stores.put(&self.cache_name, &request.url, &response) {
        warn!(url = %request.url, "failed to cache response: {err:#}");
      }
    }

    Ok(Served::from_network(response))
  }
}

#[async_trait]
impl<S: CacheStores, F: Fetch> LifecycleHandler for CacheController<S, F> {
  async fn on_install(&self) -> Result<()> {
    self.install().await
  }

  async fn on_activate(&self) -> Result<()> {
    self.activate().await
  }

  async fn on_fetch(&self, request: &Request) -> Result<Served> {
    self.handle_fetch(request).await
  }
}
