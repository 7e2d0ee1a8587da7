use tracing::{debug, info, warn};

use super::{CatalogProvider, ProviderOutput};
use crate::types::Record;

/// Ordered list of catalog providers; the first one that delivers wins
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn CatalogProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Box<dyn CatalogProvider>) {
        self.providers.push(provider);
    }

    pub fn with(mut self, provider: Box<dyn CatalogProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Runs providers in registration order until one returns records.
    /// Providers after the winner are never called.
    pub async fn select(&self, records: &[Record]) -> Option<(&'static str, ProviderOutput)> {
        for provider in &self.providers {
            let name = provider.name();
            match provider.process(records).await {
                Ok(output) if !output.records.is_empty() => {
                    info!("Provider '{}' enriched {} records", name, output.records.len());
                    return Some((name, output));
                }
                Ok(_) => debug!("Provider '{}' returned no records, trying next", name),
                Err(e) => warn!("Provider '{}' failed: {}", name, e),
            }
        }
        None
    }
}
