//! External collaborators behind narrow traits: the classifier, the
//! enrichment generator, and the image payload they consume.

pub mod classifier;
pub mod command;
pub mod deadline;
pub mod enrichment;
pub mod image;

use std::sync::Arc;

pub use classifier::{Classifier, FixtureClassifier, ModelLoader, SharedModel};
pub use enrichment::{Enricher, PlaceholderEnricher};
pub use image::{ImageFormat, ImagePayload, ImageSummary};

use crate::core::config::{ClassifierBackend, Config, EnrichmentBackend};
use crate::core::errors::{BevError, Result};
use classifier::{CommandLoader, FixtureLoader};
use command::ExternalCommand;
use enrichment::CommandEnricher;

/// Build the process-wide classifier described by `config`.
///
/// The returned handle is meant to be created once and cloned into every
/// session; the model itself is only loaded on the first classify call.
pub fn build_classifier(config: &Config) -> Result<Arc<dyn Classifier>> {
    match config.model.backend {
        ClassifierBackend::Fixture => Ok(Arc::new(SharedModel::new(FixtureLoader {
            path: config.model.fixture_path.clone(),
        }))),
        ClassifierBackend::Command => {
            let program = config
                .model
                .command
                .clone()
                .ok_or_else(|| BevError::InvalidConfig {
                    details: "model.backend = \"command\" requires model.command".to_string(),
                })?;
            Ok(Arc::new(SharedModel::new(CommandLoader {
                command: ExternalCommand::new(program, config.model.args.clone())
                    .with_time_limit(config.model.classify_timeout()),
                model_id: config.model.model_id.clone(),
                labels: config.labels.candidates.clone(),
            })))
        }
    }
}

/// Build the enrichment port described by `config`.
pub fn build_enricher(config: &Config) -> Result<Arc<dyn Enricher>> {
    match config.enrichment.backend {
        EnrichmentBackend::Placeholder => Ok(Arc::new(PlaceholderEnricher)),
        EnrichmentBackend::Command => {
            let program =
                config
                    .enrichment
                    .command
                    .clone()
                    .ok_or_else(|| BevError::InvalidConfig {
                        details: "enrichment.backend = \"command\" requires enrichment.command"
                            .to_string(),
                    })?;
            Ok(Arc::new(CommandEnricher::new(
                ExternalCommand::new(program, config.enrichment.args.clone())
                    .with_time_limit(config.enrichment.timeout()),
                &config.enrichment.model,
                config.enrichment.max_tokens,
            )))
        }
    }
}
