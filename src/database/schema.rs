use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Account {
    pub id: Id,
    pub email: String,
    /// Argon2 PHC string. Never the plaintext.
    #[serde(skip_serializing)]
    pub password: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Token {
    pub account_id: Id,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Tag and Ingredient share one contract; the kind picks the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Tag,
    Ingredient,
}

impl TaxonomyKind {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Tag => "tags",
            Self::Ingredient => "ingredients",
        }
    }

    pub fn link_table(&self) -> &'static str {
        match self {
            Self::Tag => "recipe_tags",
            Self::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(&self) -> &'static str {
        match self {
            Self::Tag => "tag_id",
            Self::Ingredient => "ingredient_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntity {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub time_minutes: i64,
    pub price: f64,
    pub link: Option<String>,
    pub image: Option<String>,
}

/// Detail view: the recipe row with its associations expanded inline.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub tags: Vec<TaxonomyEntity>,
    pub ingredients: Vec<TaxonomyEntity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: f64,
    pub link: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Id>,
    #[serde(default)]
    pub ingredient_ids: Vec<Id>,
}

/// Partial update payload. `None` leaves the field untouched; a present
/// id list replaces the full association set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<Id>>,
    pub ingredient_ids: Option<Vec<Id>>,
}
