//! Path builder selection from configuration

use tracing::debug;

use super::batch::BatchPathBuilder;
use super::context_insensitive::ContextInsensitivePathBuilder;
use super::context_sensitive::ContextSensitivePathBuilder;
use super::empty::EmptyPathBuilder;
use super::source_finder::ContextInsensitiveSourceFinder;
use crate::config::{PathBuildingAlgorithm, PathConfig, Validatable};
use crate::errors::Result;
use crate::features::ifds::context::AnalysisContext;
use crate::features::path_reconstruction::ports::AbstractionPathBuilder;
use crate::shared::GraphKey;

/// Creates the builder named by [`PathConfig::path_building_algorithm`]
///
/// Every concurrent builder is wrapped in a [`BatchPathBuilder`] sized by
/// `batch_size`; `None` yields an [`EmptyPathBuilder`].
#[derive(Debug, Clone)]
pub struct PathBuilderFactory {
    config: PathConfig,
}

impl PathBuilderFactory {
    pub fn new(config: PathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    pub fn create<N: GraphKey, M: GraphKey>(
        &self,
        ctx: AnalysisContext<N, M>,
    ) -> Result<Box<dyn AbstractionPathBuilder<N>>> {
        self.config.validate()?;
        let algorithm = self.config.path_building_algorithm;
        debug!(algorithm = ?algorithm, batch_size = self.config.batch_size, "Creating path builder");

        let inner: Box<dyn AbstractionPathBuilder<N>> = match algorithm {
            PathBuildingAlgorithm::None => return Ok(Box::new(EmptyPathBuilder::new())),
            PathBuildingAlgorithm::ContextInsensitiveSourceFinder => Box::new(
                ContextInsensitiveSourceFinder::new(ctx, self.config.clone())?,
            ),
            PathBuildingAlgorithm::ContextInsensitive => Box::new(
                ContextInsensitivePathBuilder::new(ctx, self.config.clone())?,
            ),
            PathBuildingAlgorithm::ContextSensitive => Box::new(
                ContextSensitivePathBuilder::new(ctx, self.config.clone())?,
            ),
        };
        Ok(Box::new(BatchPathBuilder::new(inner, self.config.batch_size)))
    }

    /// Whether the configured builder produces statement paths
    pub fn supports_path_reconstruction(&self) -> bool {
        matches!(
            self.config.path_building_algorithm,
            PathBuildingAlgorithm::ContextInsensitive | PathBuildingAlgorithm::ContextSensitive
        )
    }

    pub fn is_context_sensitive(&self) -> bool {
        self.config.path_building_algorithm == PathBuildingAlgorithm::ContextSensitive
    }
}
