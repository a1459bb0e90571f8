//! Cache → primary provider → fallback provider → cache write.

use crate::{
    cache::ResultCache,
    config::Config,
    domain::{extract_main_domain, host_from_url},
    errors::IcpError,
    fetcher::RetryingFetcher,
    providers::{ProviderConfig, ProviderTable},
    store::{FileStore, KeyValueStore, MemoryStore},
    LookupOutcome, LookupRecord, RecordSource,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct LookupPipeline {
    fetcher: RetryingFetcher,
    cache: ResultCache,
    primary: ProviderConfig,
    fallback: Option<ProviderConfig>,
}

impl LookupPipeline {
    /// Build a pipeline from identifiers resolved against `providers`.
    ///
    /// Unknown identifiers fail here, before any lookup runs. The cache uses
    /// the primary provider's TTL.
    pub fn new(
        providers: &ProviderTable,
        primary: &str,
        fallback: Option<&str>,
        fetcher: RetryingFetcher,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, IcpError> {
        let primary = providers.get(primary)?.clone();
        let fallback = fallback.map(|id| providers.get(id).cloned()).transpose()?;
        let cache = ResultCache::new(store, primary.cache_ttl);

        info!(
            primary = %primary.id,
            fallback = fallback.as_ref().map(|p| p.id.as_str()).unwrap_or("none"),
            "LookupPipeline initialized"
        );

        Ok(Self {
            fetcher,
            cache,
            primary,
            fallback,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, IcpError> {
        let providers = ProviderTable::from_config(config)?;
        let fetcher = RetryingFetcher::from_config(config)?;
        let store: Arc<dyn KeyValueStore> = match &config.cache_path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new(config.cache_max_entries)),
        };

        Self::new(
            &providers,
            &config.primary_provider,
            config.fallback_provider.as_deref(),
            fetcher,
            store,
        )
    }

    /// Look up the record for `hostname`. Never fails.
    pub async fn lookup(&self, hostname: &str) -> LookupRecord {
        self.lookup_detailed(hostname).await.record
    }

    /// Look up the record for the host of a page URL.
    pub async fn lookup_url(&self, page_url: &str) -> Result<LookupOutcome, IcpError> {
        let host = host_from_url(page_url)?;
        Ok(self.lookup_detailed(&host).await)
    }

    pub async fn lookup_detailed(&self, hostname: &str) -> LookupOutcome {
        self.run(hostname, false).await
    }

    /// Skip the cache read but still store a fresh result.
    pub async fn lookup_fresh(&self, hostname: &str) -> LookupOutcome {
        self.run(hostname, true).await
    }

    async fn run(&self, hostname: &str, fresh: bool) -> LookupOutcome {
        let domain = extract_main_domain(hostname);

        if !fresh {
            if let Some(record) = self.cache.get(&domain).await {
                return LookupOutcome {
                    domain,
                    record,
                    source: RecordSource::Cache,
                };
            }
        }

        let providers = std::iter::once(&self.primary).chain(self.fallback.as_ref());
        for provider in providers {
            if let Some(record) = self.query_provider(provider, &domain).await {
                self.cache.set(&domain, &record).await;
                return LookupOutcome {
                    domain,
                    record,
                    source: RecordSource::Provider(provider.id),
                };
            }
        }

        warn!("No provider returned a record for {}", domain);
        LookupOutcome {
            domain,
            record: LookupRecord::not_found(),
            source: RecordSource::NotFound,
        }
    }

    async fn query_provider(&self, provider: &ProviderConfig, domain: &str) -> Option<LookupRecord> {
        let url = provider.url_for(domain);
        info!("Querying {}: {}", provider.id, url);

        match self.fetcher.fetch(url.as_str(), provider.retry_count).await {
            Ok(raw) => provider.parse(&raw),
            Err(e) => {
                debug!("{} unavailable for {}: {}", provider.id, domain, e);
                None
            }
        }
    }

    /// Query URL against the primary provider, for linking to the raw API.
    pub fn direct_url(&self, domain: &str) -> String {
        self.primary.url_for(domain).into()
    }

    /// The primary provider's endpoint without a query, for when no domain is known.
    pub fn provider_url(&self) -> String {
        self.primary.base_url.to_string()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}
