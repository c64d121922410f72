//! HTTP Client Pool: domain-keyed `reqwest::Client` reuse with lifetime and
//! idle eviction, so the fetcher never pays connection setup cost per
//! request but also never pins a domain to a client forever.
//!
//! The source crawler built one client and reused it everywhere; this keeps
//! the same `Client::builder()` recipe but keys a bounded pool by domain so
//! per-domain settings (distinct proxy, distinct user agent) can diverge.

use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

#[derive(Debug, Clone)]
pub struct HttpClientPoolConfig {
    pub max_clients: usize,
    pub max_clients_per_domain: usize,
    pub max_client_lifetime: Duration,
    pub max_idle_time: Duration,
    pub enable_domain_isolation: bool,
    pub cleanup_interval: Duration,
}

impl Default for HttpClientPoolConfig {
    fn default() -> Self {
        Self {
            max_clients: 50,
            max_clients_per_domain: 4,
            max_client_lifetime: Duration::from_secs(600),
            max_idle_time: Duration::from_secs(90),
            enable_domain_isolation: true,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

struct PooledClient {
    client: Client,
    created_at: Instant,
    last_used: Instant,
}

/// Builds a client the same way the single-client fetcher used to: a fixed
/// user agent, manual redirects, gzip/brotli, and an optional upstream proxy.
pub fn build_client(user_agent: &str, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .https_only(true)
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Domain-keyed pool of reusable HTTP clients bounded by global and
/// per-domain caps, with a background janitor evicting expired clients.
pub struct HttpClientPool {
    config: HttpClientPoolConfig,
    user_agent: String,
    global_permits: Arc<Semaphore>,
    domains: Mutex<HashMap<String, Vec<PooledClient>>>,
}

impl HttpClientPool {
    pub fn new(config: HttpClientPoolConfig, user_agent: String) -> Self {
        let global_permits = Arc::new(Semaphore::new(config.max_clients));
        Self {
            config,
            user_agent,
            global_permits,
            domains: Mutex::new(HashMap::new()),
        }
    }

    fn pool_key(&self, domain: &str) -> String {
        if self.config.enable_domain_isolation {
            domain.to_string()
        } else {
            "*".to_string()
        }
    }

    /// Hands back a reusable client for `domain`, building a fresh one if
    /// none are pooled or the pool for this domain is still under its cap.
    pub async fn acquire(&self, domain: &str, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
        let key = self.pool_key(domain);
        let mut domains = self.domains.lock().await;
        let bucket = domains.entry(key).or_default();

        if let Some(pooled) = bucket.pop() {
            if pooled.created_at.elapsed() < self.config.max_client_lifetime {
                let client = pooled.client.clone();
                bucket.push(PooledClient {
                    client: client.clone(),
                    created_at: pooled.created_at,
                    last_used: Instant::now(),
                });
                return Ok(client);
            }
        }

        let client = build_client(&self.user_agent, proxy)?;
        if bucket.len() < self.config.max_clients_per_domain {
            bucket.push(PooledClient {
                client: client.clone(),
                created_at: Instant::now(),
                last_used: Instant::now(),
            });
        }
        Ok(client)
    }

    /// Acquires a global concurrency permit bounding total in-flight clients
    /// across all domains, independent of per-domain caps.
    pub async fn acquire_global_permit(&self) -> tokio::sync::OwnedSemaphorePermit {
        self.global_permits
            .clone()
            .acquire_owned()
            .await
            .expect("global semaphore never closed")
    }

    /// Drops clients past their lifetime or idle timeout. Intended to be
    /// driven by a periodic `tokio::time::interval` task at
    /// `config.cleanup_interval`.
    pub async fn evict_expired(&self) {
        let mut domains = self.domains.lock().await;
        for bucket in domains.values_mut() {
            bucket.retain(|pooled| {
                pooled.created_at.elapsed() < self.config.max_client_lifetime
                    && pooled.last_used.elapsed() < self.config.max_idle_time
            });
        }
        domains.retain(|_, bucket| !bucket.is_empty());
    }

    pub async fn pooled_client_count(&self) -> usize {
        self.domains.lock().await.values().map(|b| b.len()).sum()
    }
}

/// Spawns the background janitor task that periodically evicts expired
/// clients from `pool`. Returns the task handle so callers can abort it on
/// engine shutdown.
pub fn spawn_janitor(pool: Arc<HttpClientPool>) -> tokio::task::JoinHandle<()> {
    let interval = pool.config.cleanup_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            pool.evict_expired().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> HttpClientPool {
        HttpClientPool::new(HttpClientPoolConfig::default(), "ripcrawl-test/1.0".to_string())
    }

    #[tokio::test]
    async fn acquire_returns_a_usable_client() {
        let pool = test_pool();
        let client = pool.acquire("example.com", None).await;
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn reuses_pooled_client_within_lifetime() {
        let pool = test_pool();
        let _ = pool.acquire("example.com", None).await.unwrap();
        assert_eq!(pool.pooled_client_count().await, 1);
        let _ = pool.acquire("example.com", None).await.unwrap();
        assert_eq!(pool.pooled_client_count().await, 1);
    }

    #[tokio::test]
    async fn domain_isolation_keeps_separate_pools() {
        let pool = test_pool();
        let _ = pool.acquire("a.com", None).await.unwrap();
        let _ = pool.acquire("b.com", None).await.unwrap();
        assert_eq!(pool.pooled_client_count().await, 2);
    }

    #[tokio::test]
    async fn disabling_domain_isolation_shares_one_pool() {
        let mut config = HttpClientPoolConfig::default();
        config.enable_domain_isolation = false;
        let pool = HttpClientPool::new(config, "ripcrawl-test/1.0".to_string());
        let _ = pool.acquire("a.com", None).await.unwrap();
        let _ = pool.acquire("b.com", None).await.unwrap();
        assert_eq!(pool.pooled_client_count().await, 1);
    }

    #[tokio::test]
    async fn evict_expired_removes_stale_entries() {
        let mut config = HttpClientPoolConfig::default();
        config.max_idle_time = Duration::from_millis(0);
        let pool = HttpClientPool::new(config, "ripcrawl-test/1.0".to_string());
        let _ = pool.acquire("example.com", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        pool.evict_expired().await;
        assert_eq!(pool.pooled_client_count().await, 0);
    }

    #[test]
    fn build_client_with_proxy_succeeds() {
        let result = build_client("ripcrawl-test/1.0", Some("http://127.0.0.1:8080"));
        assert!(result.is_ok());
    }
}
