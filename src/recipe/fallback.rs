//! Template recipes used when the generation service is unavailable.

use rand::Rng;

/// Source of the uniform choice between fallback templates
pub trait TemplatePicker: Send + Sync {
    /// Pick an index in `0..len`. `len` is always non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl TemplatePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always picks the same index (wrapped into range)
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl TemplatePicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    StirFry,
    Soup,
    Bake,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::StirFry, Template::Soup, Template::Bake];

    pub fn name(&self) -> &'static str {
        match self {
            Template::StirFry => "Quick Stir Fry",
            Template::Soup => "Simple Soup",
            Template::Bake => "Easy Bake",
        }
    }

    fn instructions(&self, ingredients: &str) -> String {
        match self {
            Template::StirFry => format!(
                "1. Heat oil in a large pan or wok over high heat.\n\
                 2. Add your ingredients ({ingredients}) and stir-fry for 5-7 minutes.\n\
                 3. Season with soy sauce, garlic, and ginger to taste.\n\
                 4. Serve hot over rice or noodles."
            ),
            Template::Soup => format!(
                "1. Bring 4 cups of broth to a boil in a large pot.\n\
                 2. Add chopped {ingredients}.\n\
                 3. Simmer for 20-25 minutes until tender.\n\
                 4. Season with salt, pepper, and herbs to taste.\n\
                 5. Serve hot with crusty bread."
            ),
            Template::Bake => format!(
                "1. Preheat oven to 375°F (190°C).\n\
                 2. Arrange {ingredients} in a baking dish.\n\
                 3. Drizzle with olive oil and season with salt and pepper.\n\
                 4. Bake for 25-30 minutes until golden and cooked through.\n\
                 5. Let rest for 5 minutes before serving."
            ),
        }
    }

    /// Render the full recipe text for an already-parsed ingredient list
    pub fn render(&self, ingredients: &[String]) -> String {
        let joined = ingredients.join(", ");
        format!(
            "**{}**\n\nIngredients: {}\n\n{}",
            self.name(),
            joined,
            self.instructions(&joined)
        )
    }
}

/// Split a free-text list on commas, trimming entries and dropping empty ones
pub fn parse_ingredients(ingredients: &str) -> Vec<String> {
    ingredients
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render a template recipe, letting `picker` choose the template
pub fn fallback_recipe(ingredients: &str, picker: &dyn TemplatePicker) -> String {
    let list = parse_ingredients(ingredients);
    let template = Template::ALL[picker.pick(Template::ALL.len()) % Template::ALL.len()];
    template.render(&list)
}
