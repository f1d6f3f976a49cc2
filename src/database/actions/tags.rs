use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{Id, LinkedRecipeTag, Tag},
    serializers::TagPayload,
};

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

/// Tags of every recipe in `recipe_ids`, in one query.
pub async fn list_recipe_tags(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<LinkedRecipeTag>, Error> {
    let list: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT tr.recipe_id AS recipe_id, t.id AS id, t.name AS name, t.color AS color, t.slug AS slug
        FROM tag_recipes tr
        INNER JOIN tags t ON t.id = tr.tag_id
        WHERE tr.recipe_id = ANY($1)
        ORDER BY t.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn create_tag(tag: TagPayload, pool: &Pool<Postgres>) -> Result<Tag, Error> {
    let row: Option<Tag> = sqlx::query_as(
        "
        INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
        RETURNING id, name, color, slug
    ",
    )
    .bind(tag.name)
    .bind(tag.color)
    .bind(tag.slug)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    let tag = row.ok_or_else(|| {
        HtmlError::InvalidRequest.new("A tag with this name, color or slug already exists")
    })?;
    log::info!("Created tag {} ({})", tag.slug, tag.id);

    Ok(tag)
}

pub async fn delete_tag(id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("No tag exists with specified id"));
    }

    log::info!("Deleted tag {id}");
    Ok(())
}
