use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    authentication::permissions::ActionType,
    config::Limits,
    error::{Error, HtmlError, QueryError},
    jwt::SessionData,
    pagination::{PageContext, PageRequest},
    schema::{Id, Recipe, RecipePart, RecipeRow, Tag},
    serializers::{RecipeDraft, RecipeRead},
};

use super::tags::list_recipe_tags;

/// Query string filters of the recipe list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    /// Tag slugs; a recipe matches if it has any of them.
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

fn push_recipe_select(query_builder: &mut QueryBuilder<'_, Postgres>, viewer: Option<Id>) {
    query_builder.push(
        "
        SELECT r.id, r.name, r.image, r.text, r.cooking_time,
            u.id AS author_id, u.email AS author_email, u.username AS author_username,
            u.first_name AS author_first_name, u.last_name AS author_last_name,
            EXISTS (SELECT 1 FROM follows fo WHERE fo.author_id = u.id AND fo.user_id = ",
    );
    query_builder.push_bind(viewer);
    query_builder.push(
        ") AS author_is_subscribed,
            EXISTS (SELECT 1 FROM favorites fa WHERE fa.recipe_id = r.id AND fa.user_id = ",
    );
    query_builder.push_bind(viewer);
    query_builder.push(
        ") AS is_favorited,
            EXISTS (SELECT 1 FROM carts ca WHERE ca.recipe_id = r.id AND ca.user_id = ",
    );
    query_builder.push_bind(viewer);
    query_builder.push(
        ") AS is_in_shopping_cart,
            COUNT(*) OVER() AS count
        FROM recipes r
        INNER JOIN users u ON u.id = r.author_id
        WHERE TRUE",
    );
}

pub async fn list_recipe_parts(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, Error> {
    let rows: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT ir.recipe_id AS recipe_id, i.id AS id, i.name AS name,
            i.measurement_unit AS measurement_unit, ir.amount AS amount
        FROM ingredient_recipes ir
        INNER JOIN ingredients i ON i.id = ir.ingredient_id
        WHERE ir.recipe_id = ANY($1)
        ORDER BY ir.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Attaches tags and ingredients to the rows with two queries in total.
async fn read_recipes(
    rows: Vec<RecipeRow>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeRead>, Error> {
    let ids: Vec<Id> = rows.iter().map(|row| row.id).collect();
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut tags: HashMap<Id, Vec<Tag>> = HashMap::new();
    for tag in list_recipe_tags(&ids, pool).await? {
        tags.entry(tag.recipe_id).or_default().push(tag.into());
    }

    let mut parts: HashMap<Id, Vec<RecipePart>> = HashMap::new();
    for part in list_recipe_parts(&ids, pool).await? {
        parts.entry(part.recipe_id).or_default().push(part);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let recipe_tags = tags.remove(&row.id).unwrap_or_default();
            let recipe_parts = parts.remove(&row.id).unwrap_or_default();
            RecipeRead::from_row(row, recipe_tags, recipe_parts)
        })
        .collect())
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRead>, Error> {
    if viewer.is_none() && (filter.is_favorited || filter.is_in_shopping_cart) {
        return Ok(PageContext::no_rows());
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    push_recipe_select(&mut query_builder, viewer);

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query_builder
            .push(
                " AND EXISTS (SELECT 1 FROM tag_recipes tr INNER JOIN tags t ON t.id = tr.tag_id WHERE tr.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    if filter.is_favorited {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(viewer)
            .push(")");
    }
    if filter.is_in_shopping_cart {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM carts c WHERE c.recipe_id = r.id AND c.user_id = ")
            .push_bind(viewer)
            .push(")");
    }

    query_builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRow> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let results = read_recipes(rows, pool).await?;

    Ok(PageContext::from_rows(results, total_count, page))
}

pub async fn get_recipe_read(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeRead>, Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("");
    push_recipe_select(&mut query_builder, viewer);
    query_builder.push(" AND r.id = ").push_bind(id);

    let row: Option<RecipeRow> = query_builder
        .build_query_as()
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    match row {
        Some(row) => Ok(read_recipes(vec![row], pool).await?.into_iter().next()),
        None => Ok(None),
    }
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// The recipe, if the session may change it: its author, or anyone allowed
/// to manage every recipe.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))?;

    session.authenticate(ActionType::ManageOwnRecipes)?;
    if recipe.author_id != session.user_id {
        session.authenticate(ActionType::ManageAllRecipes)?;
    }

    Ok(recipe)
}

async fn insert_recipe_parts(
    recipe_id: Id,
    parts: &[(Id, i16)],
    limits: &Limits,
    conn: &mut PgConnection,
) -> Result<(), Error> {
    if let Some((ingredient_id, amount)) = parts
        .iter()
        .find(|(_, amount)| i32::from(*amount) < limits.min_ingredient_amount)
    {
        log::warn!("Rejected amount {amount} of ingredient {ingredient_id} for recipe {recipe_id}");
        return Err(HtmlError::InvalidRequest
            .new(&format!(
                "Ensure this value is greater than or equal to {}.",
                limits.min_ingredient_amount
            ))
            .on("ingredients"));
    }
    if parts.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO ingredient_recipes (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(parts, |mut b, (ingredient_id, amount)| {
        b.push_bind(recipe_id)
            .push_bind(*ingredient_id)
            .push_bind(*amount);
    });

    query_builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

async fn insert_recipe_tags(
    recipe_id: Id,
    tags: &[Id],
    conn: &mut PgConnection,
) -> Result<(), Error> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO tag_recipes (recipe_id, tag_id) ");
    query_builder.push_values(tags, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });

    query_builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Writes the recipe, its ingredient amounts and its tags in one
/// transaction. Nothing is stored if any part fails.
pub async fn create_recipe(
    author_id: Id,
    draft: &RecipeDraft,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<Id, Error> {
    let image = draft
        .image
        .as_deref()
        .ok_or_else(|| HtmlError::InvalidRequest.new("This field is required.").on("image"))?;

    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    let (recipe_id,): (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    insert_recipe_parts(recipe_id, &draft.ingredients, limits, &mut tr).await?;
    insert_recipe_tags(recipe_id, &draft.tags, &mut tr).await?;

    tr.commit().await.map_err(QueryError::from)?;

    log::info!("User {author_id} created recipe {recipe_id}");
    Ok(recipe_id)
}

/// Replaces the recipe's fields, ingredient amounts and tags. An absent image
/// keeps the stored one.
pub async fn update_recipe(
    recipe_id: Id,
    draft: &RecipeDraft,
    limits: &Limits,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    let result = sqlx::query(
        "
        UPDATE recipes
        SET name = $1, image = COALESCE($2, image), text = $3, cooking_time = $4
        WHERE id = $5
    ",
    )
    .bind(&draft.name)
    .bind(draft.image.as_deref())
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(recipe_id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("No recipe exists with specified id"));
    }

    sqlx::query("DELETE FROM ingredient_recipes WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;
    sqlx::query("DELETE FROM tag_recipes WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;

    insert_recipe_parts(recipe_id, &draft.ingredients, limits, &mut tr).await?;
    insert_recipe_tags(recipe_id, &draft.tags, &mut tr).await?;

    tr.commit().await.map_err(QueryError::from)?;

    log::info!("Updated recipe {recipe_id}");
    Ok(())
}

pub async fn delete_recipe(recipe_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("No recipe exists with specified id"));
    }

    log::info!("Deleted recipe {recipe_id}");
    Ok(())
}
