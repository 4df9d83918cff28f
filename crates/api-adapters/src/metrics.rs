//! Prometheus counters exposed at `/metrics`.

use std::fmt;

use domains::{ActionType, ContentSource};
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SourceLabels {
    pub source: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ActionLabels {
    pub action: String,
}

pub struct CatalogMetrics {
    registry: Registry,
    feed_requests: Counter,
    feed_degraded: Family<SourceLabels, Counter>,
    moderation_actions: Family<ActionLabels, Counter>,
}

impl Default for CatalogMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("catalog");
        let feed_requests = Counter::default();
        let feed_degraded = Family::<SourceLabels, Counter>::default();
        let moderation_actions = Family::<ActionLabels, Counter>::default();

        registry.register("feed_requests", "Feed requests served", feed_requests.clone());
        registry.register(
            "feed_degraded",
            "Feed responses built without one of the sources",
            feed_degraded.clone(),
        );
        registry.register(
            "moderation_actions",
            "Moderation actions applied, by type",
            moderation_actions.clone(),
        );

        Self { registry, feed_requests, feed_degraded, moderation_actions }
    }

    pub fn record_feed(&self, degraded: &[ContentSource]) {
        self.feed_requests.inc();
        for source in degraded {
            let source = match source {
                ContentSource::Legacy => "legacy",
                ContentSource::Managed => "managed",
            };
            self.feed_degraded.get_or_create(&SourceLabels { source: source.into() }).inc();
        }
    }

    pub fn record_moderation(&self, action: ActionType) {
        self.moderation_actions
            .get_or_create(&ActionLabels { action: action.as_str().into() })
            .inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}
