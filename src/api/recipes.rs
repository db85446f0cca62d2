use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::recipe::GeneratedRecipe;
use crate::AppState;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateRecipeRequest {
    #[serde(default)]
    pub ingredients: Option<String>,
}

/// Generate a recipe from a free-text ingredient list.
/// Unreadable bodies are answered with the same JSON error shape as validation failures.
pub async fn generate_recipe(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): WithRejection<Json<GenerateRecipeRequest>, ApiError>,
) -> Result<Json<GeneratedRecipe>, ApiError> {
    let ingredients = req.ingredients.unwrap_or_default();
    let recipe = state.recipes.generate(&ingredients).await?;

    tracing::info!(source = %recipe.source, "Recipe generated");
    Ok(Json(recipe))
}
