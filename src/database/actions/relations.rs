use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{Id, RecipeBrief},
};

/// A (user, recipe) pair the caller can add once and remove again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRelation {
    Favorite,
    ShoppingCart,
}

impl RecipeRelation {
    fn table(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::ShoppingCart => "carts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::ShoppingCart => "shopping cart",
        }
    }
}

pub async fn get_recipe_brief(
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeBrief>, Error> {
    let row: Option<RecipeBrief> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

async fn existing_recipe(id: Id, pool: &Pool<Postgres>) -> Result<RecipeBrief, Error> {
    get_recipe_brief(id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))
}

pub async fn add_recipe_relation(
    relation: RecipeRelation,
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<RecipeBrief, Error> {
    let recipe = existing_recipe(recipe_id, pool).await?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::InvalidRequest.new(&format!(
            "Recipe is already in {}",
            relation.label()
        )));
    }

    log::info!("User {user_id} added recipe {recipe_id} to {}", relation.label());
    Ok(recipe)
}

pub async fn remove_recipe_relation(
    relation: RecipeRelation,
    recipe_id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    existing_recipe(recipe_id, pool).await?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new(&format!("Recipe is not in {}", relation.label())));
    }

    log::info!("User {user_id} removed recipe {recipe_id} from {}", relation.label());
    Ok(())
}
