//! Client-side list of generated recipes, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GeneratedRecipe, RecipeSource};

/// One result as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub ingredients: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub source: RecipeSource,
}

impl RecipeEntry {
    pub fn new(ingredients: impl Into<String>, recipe: GeneratedRecipe) -> Self {
        Self {
            ingredients: ingredients.into(),
            content: recipe.recipe,
            timestamp: recipe.timestamp,
            source: recipe.source,
        }
    }

    /// Label shown next to the recipe
    pub fn source_label(&self) -> &'static str {
        match self.source {
            RecipeSource::Generated => "AI generated",
            RecipeSource::Fallback => "Template recipe",
        }
    }
}

/// In-memory results list. Nothing is persisted.
#[derive(Debug, Default, Clone)]
pub struct RecipeHistory {
    entries: Vec<RecipeEntry>,
}

impl RecipeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result in front of everything already shown
    pub fn push(&mut self, entry: RecipeEntry) {
        self.entries.insert(0, entry);
    }

    pub fn entries(&self) -> &[RecipeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
