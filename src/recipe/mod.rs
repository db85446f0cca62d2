//! Recipe generation: one upstream attempt, template fallback on any failure.
//!
//! [`RecipeService::generate`] only fails for blank input. Every upstream
//! problem (missing token, transport error, bad status, unrecognized body) is
//! logged and answered with a template recipe tagged [`RecipeSource::Fallback`].

pub mod fallback;
pub mod history;
pub mod huggingface;

pub use fallback::{FixedPicker, RandomPicker, Template, TemplatePicker};
pub use history::{RecipeEntry, RecipeHistory};
pub use huggingface::{Generation, HuggingFaceClient, TextGenerator, UpstreamGenerationError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RecipeConfig;

/// Where a recipe's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    /// Produced by the external generation model
    Generated,
    /// Rendered from a local template
    Fallback,
}

impl std::fmt::Display for RecipeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeSource::Generated => write!(f, "generated"),
            RecipeSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of a generation request, as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub recipe: String,
    pub source: RecipeSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("{0}")]
    Validation(String),
}

pub struct RecipeService {
    generator: Option<Arc<dyn TextGenerator>>,
    picker: Arc<dyn TemplatePicker>,
}

impl RecipeService {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, picker: Arc<dyn TemplatePicker>) -> Self {
        Self { generator, picker }
    }

    /// Upstream client when a token is configured, random template choice
    pub fn from_config(config: &RecipeConfig) -> Result<Self, UpstreamGenerationError> {
        let generator = HuggingFaceClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
        Ok(Self::new(generator, Arc::new(RandomPicker)))
    }

    /// Whether an upstream generator is configured at all
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn generate(&self, ingredients: &str) -> Result<GeneratedRecipe, RecipeError> {
        let ingredients = ingredients.trim();
        if ingredients.is_empty() {
            return Err(RecipeError::Validation("Ingredients are required".to_string()));
        }

        let Some(generator) = &self.generator else {
            debug!("No generation service configured, using fallback recipe");
            return Ok(self.fallback(ingredients));
        };

        let prompt = format!("ingredients: {}", ingredients);
        match generator.generate(&prompt).await {
            Ok(generation) => Ok(GeneratedRecipe {
                recipe: generation.text,
                source: RecipeSource::Generated,
                timestamp: generation.timestamp.unwrap_or_else(Utc::now),
            }),
            Err(e) => {
                warn!(error = %e, "Recipe generation failed, using fallback recipe");
                Ok(self.fallback(ingredients))
            }
        }
    }

    fn fallback(&self, ingredients: &str) -> GeneratedRecipe {
        GeneratedRecipe {
            recipe: fallback::fallback_recipe(ingredients, self.picker.as_ref()),
            source: RecipeSource::Fallback,
            timestamp: Utc::now(),
        }
    }
}
