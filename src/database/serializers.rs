//! JSON payloads accepted by the API and the representations it returns.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    config::Limits,
    constants::{
        EMAIL_MAX_LENGTH, FIRST_AND_LAST_NAME_MAX_LENGTH, INGREDIENT_NAME_MAX_LENGTH,
        MEASUREMENT_UNIT_MAX_LENGTH, RECIPE_NAME_MAX_LENGTH, RESERVED_USERNAMES, SMALLINT_MAX,
        TAG_NAME_MAX_LENGTH, TAG_SLUG_MAX_LENGTH, USERNAME_MAX_LENGTH,
    },
};

use super::{
    error::{Error, HtmlError},
    schema::{Id, RecipeBrief, RecipePart, RecipeRow, Tag, User, UserRow},
};

fn invalid(field: &str, info: &str) -> Error {
    HtmlError::InvalidRequest.new(info).on(field)
}

fn required_text(field: &str, value: &str, max_length: usize) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(invalid(field, "This field may not be blank."));
    }
    if value.chars().count() > max_length {
        return Err(invalid(
            field,
            &format!("Ensure this field has no more than {max_length} characters."),
        ));
    }
    Ok(())
}

fn in_range(field: &str, value: i32, min: i32) -> Result<i16, Error> {
    if value < min {
        return Err(invalid(
            field,
            &format!("Ensure this value is greater than or equal to {min}."),
        ));
    }
    if value > SMALLINT_MAX {
        return Err(invalid(
            field,
            &format!("Ensure this value is less than or equal to {SMALLINT_MAX}."),
        ));
    }
    Ok(value as i16)
}

// Write side

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientAmountPayload {
    pub id: Id,
    pub amount: i32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RecipePayload {
    pub ingredients: Vec<IngredientAmountPayload>,
    pub tags: Vec<Id>,
    #[serde(default)]
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// A recipe payload that passed validation; what the write path stores.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i16,
    pub ingredients: Vec<(Id, i16)>,
    pub tags: Vec<Id>,
}

impl RecipePayload {
    pub fn validate(self, limits: &Limits, require_image: bool) -> Result<RecipeDraft, Error> {
        required_text("name", &self.name, RECIPE_NAME_MAX_LENGTH)?;
        required_text("text", &self.text, usize::MAX)?;
        let cooking_time = in_range("cooking_time", self.cooking_time, limits.min_cooking_time)?;

        let image = self.image.filter(|image| !image.trim().is_empty());
        if require_image && image.is_none() {
            return Err(invalid("image", "This field is required."));
        }

        if self.ingredients.is_empty() {
            return Err(invalid("ingredients", "At least one ingredient is required."));
        }
        let mut seen = HashSet::new();
        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for ingredient in self.ingredients {
            if !seen.insert(ingredient.id) {
                return Err(invalid("ingredients", "Ingredients must be unique."));
            }
            let amount = in_range("ingredients", ingredient.amount, limits.min_ingredient_amount)?;
            ingredients.push((ingredient.id, amount));
        }

        if self.tags.is_empty() {
            return Err(invalid("tags", "At least one tag is required."));
        }
        let mut seen = HashSet::new();
        if !self.tags.iter().all(|tag| seen.insert(*tag)) {
            return Err(invalid("tags", "Tags must be unique."));
        }

        Ok(RecipeDraft {
            name: self.name.trim().to_owned(),
            text: self.text,
            image,
            cooking_time,
            ingredients,
            tags: self.tags,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserPayload {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl UserPayload {
    pub fn validate(self) -> Result<Self, Error> {
        required_text("email", &self.email, EMAIL_MAX_LENGTH)?;
        let valid_email = self
            .email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(invalid("email", "Enter a valid email address."));
        }

        required_text("username", &self.username, USERNAME_MAX_LENGTH)?;
        let valid_username = self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'));
        if !valid_username {
            return Err(invalid("username", "Invalid characters in username."));
        }
        if RESERVED_USERNAMES.contains(&self.username.to_lowercase().as_str()) {
            return Err(invalid("username", "This username is reserved."));
        }

        required_text("first_name", &self.first_name, FIRST_AND_LAST_NAME_MAX_LENGTH)?;
        required_text("last_name", &self.last_name, FIRST_AND_LAST_NAME_MAX_LENGTH)?;
        required_text("password", &self.password, usize::MAX)?;

        Ok(Self {
            email: self.email.trim().to_lowercase(),
            ..self
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientPayload {
    pub name: String,
    pub measurement_unit: String,
}

impl IngredientPayload {
    pub fn validate(self) -> Result<Self, Error> {
        required_text("name", &self.name, INGREDIENT_NAME_MAX_LENGTH)?;
        required_text(
            "measurement_unit",
            &self.measurement_unit,
            MEASUREMENT_UNIT_MAX_LENGTH,
        )?;

        Ok(Self {
            name: self.name.trim().to_owned(),
            measurement_unit: self.measurement_unit.trim().to_owned(),
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TagPayload {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl TagPayload {
    pub fn validate(self) -> Result<Self, Error> {
        required_text("name", &self.name, TAG_NAME_MAX_LENGTH)?;

        let color = self.color.trim();
        let valid_color = color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid_color {
            return Err(invalid("color", "Enter a valid hex color, e.g. #E26C2D."));
        }

        required_text("slug", &self.slug, TAG_SLUG_MAX_LENGTH)?;
        let valid_slug = self
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_slug {
            return Err(invalid(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            ));
        }

        Ok(Self {
            color: color.to_uppercase(),
            ..self
        })
    }
}

// Read side

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserRead {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl From<UserRow> for UserRead {
    fn from(value: UserRow) -> Self {
        Self {
            email: value.email,
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
            is_subscribed: value.is_subscribed,
        }
    }
}

/// Returned once, right after registration.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserCreated {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserCreated {
    fn from(value: User) -> Self {
        Self {
            email: value.email,
            id: value.id,
            username: value.username,
            first_name: value.first_name,
            last_name: value.last_name,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TokenRead {
    pub auth_token: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubscriptionRead {
    #[serde(flatten)]
    pub author: UserRead,
    pub recipes: Vec<RecipeBrief>,
    pub recipes_count: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecipeRead {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: UserRead,
    pub ingredients: Vec<RecipePart>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i16,
}

impl RecipeRead {
    pub fn from_row(row: RecipeRow, tags: Vec<Tag>, ingredients: Vec<RecipePart>) -> Self {
        Self {
            id: row.id,
            tags,
            author: UserRead {
                email: row.author_email,
                id: row.author_id,
                username: row.author_username,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
                is_subscribed: row.author_is_subscribed,
            },
            ingredients,
            is_favorited: row.is_favorited,
            is_in_shopping_cart: row.is_in_shopping_cart,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
        }
    }
}
