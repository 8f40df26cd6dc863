//! Typed request payloads with explicit validation, enumerating
//! field-level errors the way the collaborating API layer surfaces them.

use serde::Deserialize;

use crate::constants::MIN_PASSWORD_LENGTH;

use super::error::FieldError;
use super::schema::{AccountPatch, Id, NewAccount, NewRecipe, RecipePatch};

fn email_is_well_formed(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if !email_is_well_formed(&self.email) {
            errors.push(FieldError::new("email", "must be a valid email address"));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            errors.push(FieldError::new("name", "cannot be blank"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_new_account(self) -> NewAccount {
        NewAccount {
            email: self.email,
            password: self.password,
            name: self.name,
            is_staff: false,
            is_superuser: false,
        }
    }
}

/// Token-endpoint payload. Validation is shape-only; credential failures
/// come back from the store as a single generic authentication error.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenForm {
    pub email: String,
    pub password: String,
}

impl TokenForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "cannot be blank"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "cannot be blank"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub password: Option<String>,
}

impl ProfilePatch {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            errors.push(FieldError::new("name", "cannot be blank"));
        }
        if matches!(&self.password, Some(p) if p.len() < MIN_PASSWORD_LENGTH) {
            errors.push(FieldError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_account_patch(self) -> AccountPatch {
        AccountPatch {
            name: self.name,
            password: self.password,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyForm {
    pub name: String,
}

impl TaxonomyForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        if self.name.trim().is_empty() {
            return Err(vec![FieldError::new("name", "cannot be blank")]);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeForm {
    pub title: String,
    pub time_minutes: i64,
    pub price: f64,
    pub link: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Id>,
    #[serde(default)]
    pub ingredient_ids: Vec<Id>,
}

impl RecipeForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "cannot be blank"));
        }
        if self.time_minutes < 0 {
            errors.push(FieldError::new("time_minutes", "cannot be negative"));
        }
        if self.price < 0.0 {
            errors.push(FieldError::new("price", "cannot be negative"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_new_recipe(self) -> NewRecipe {
        NewRecipe {
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            tag_ids: self.tag_ids,
            ingredient_ids: self.ingredient_ids,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatchForm {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<Id>>,
    pub ingredient_ids: Option<Vec<Id>>,
}

impl RecipePatchForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            errors.push(FieldError::new("title", "cannot be blank"));
        }
        if matches!(self.time_minutes, Some(v) if v < 0) {
            errors.push(FieldError::new("time_minutes", "cannot be negative"));
        }
        if matches!(self.price, Some(v) if v < 0.0) {
            errors.push(FieldError::new("price", "cannot be negative"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_patch(self) -> RecipePatch {
        RecipePatch {
            title: self.title,
            time_minutes: self.time_minutes,
            price: self.price,
            link: self.link,
            tag_ids: self.tag_ids,
            ingredient_ids: self.ingredient_ids,
        }
    }
}
