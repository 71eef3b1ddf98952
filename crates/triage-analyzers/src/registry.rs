//! Analyzer registry keyed by type family

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use triage_core::TypeFamily;

use crate::analyzer::{Analyzer, AnalyzerInfo};
use crate::error::AnalyzerError;

/// Lookup from [`TypeFamily`] to the one analyzer handling it.
///
/// Registration normally happens once at startup; lookups take a shared
/// read lock and may run from many requests at once.
#[derive(Clone)]
pub struct AnalyzerRegistry {
    analyzers: Arc<RwLock<HashMap<TypeFamily, Arc<dyn Analyzer>>>>,
    analyzer_info: Arc<RwLock<HashMap<TypeFamily, AnalyzerInfo>>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self {
            analyzers: Arc::new(RwLock::new(HashMap::new())),
            analyzer_info: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an analyzer for its family, replacing any previous one.
    ///
    /// Archives are expanded before dispatch and never have an analyzer.
    pub async fn register(
        &self,
        analyzer: Arc<dyn Analyzer>,
        description: impl Into<String>,
    ) -> Result<(), AnalyzerError> {
        let family = analyzer.family();
        if family == TypeFamily::Archive {
            return Err(AnalyzerError::Unsupported(family.to_string()));
        }

        let info = AnalyzerInfo {
            name: analyzer.name().to_string(),
            family,
            description: description.into(),
        };

        let mut analyzers = self.analyzers.write().await;
        let mut analyzer_info = self.analyzer_info.write().await;

        if let Some(previous) = analyzers.insert(family, analyzer) {
            tracing::debug!(family = %family, previous = %previous.name(), "Replacing analyzer");
        }
        analyzer_info.insert(family, info);

        Ok(())
    }

    pub async fn get(&self, family: TypeFamily) -> Option<Arc<dyn Analyzer>> {
        let analyzers = self.analyzers.read().await;
        analyzers.get(&family).cloned()
    }

    /// Registered analyzers, ordered by family.
    pub async fn list(&self) -> Vec<AnalyzerInfo> {
        let analyzer_info = self.analyzer_info.read().await;
        let mut infos: Vec<AnalyzerInfo> = analyzer_info.values().cloned().collect();
        infos.sort_by_key(|info| info.family);
        infos
    }

    pub async fn contains(&self, family: TypeFamily) -> bool {
        self.analyzers.read().await.contains_key(&family)
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
