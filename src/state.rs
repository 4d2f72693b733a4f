//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the image sources and fonts every export reads, plus one
//! [`Exporter`] per project so concurrent export requests for the same
//! project join a single in-flight flatten.

use std::collections::HashMap;
use std::sync::Arc;

use canvas::export::{Exporter, ImageSource, OutputFormat};
use canvas::fonts::FontBook;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;

/// Shared application state. Clone is required by Axum; every field is
/// Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sources: Arc<dyn ImageSource>,
    pub fonts: Arc<FontBook>,
    pub exporters: Arc<RwLock<HashMap<(Uuid, OutputFormat), Arc<Exporter>>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, sources: Arc<dyn ImageSource>, fonts: FontBook) -> Self {
        Self {
            config: Arc::new(config),
            sources,
            fonts: Arc::new(fonts),
            exporters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The exporter for `project_id` in `format`, created on first use.
    pub async fn exporter(&self, project_id: Uuid, format: OutputFormat) -> Arc<Exporter> {
        let key = (project_id, format);
        if let Some(exporter) = self.exporters.read().await.get(&key) {
            return Arc::clone(exporter);
        }
        let mut exporters = self.exporters.write().await;
        let exporter = exporters
            .entry(key)
            .or_insert_with(|| Arc::new(Exporter::new(Arc::clone(&self.sources), Arc::clone(&self.fonts), format)));
        Arc::clone(exporter)
    }

    /// Drop exporters with no export in flight.
    pub async fn prune_idle_exporters(&self) -> usize {
        let mut exporters = self.exporters.write().await;
        let before = exporters.len();
        exporters.retain(|_, exporter| Arc::strong_count(exporter) > 1 || exporter.is_busy());
        before - exporters.len()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use canvas::export::MemorySource;

    /// State over an in-memory source with default config and no fonts.
    pub fn test_state(source: MemorySource) -> AppState {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        AppState::new(config, Arc::new(source), FontBook::new())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
