use sqlx::{Pool, Postgres};

use crate::{
    error::{Error, HtmlError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{Id, RecipeBrief, UserRow},
    serializers::{SubscriptionRead, UserRead},
};

use super::users::get_user_row;

/// An author as seen by one of their followers: the newest `recipes_limit`
/// recipes and the total count.
pub async fn get_subscription(
    author: UserRow,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionRead, Error> {
    let recipes: Vec<RecipeBrief> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC, id DESC
        LIMIT $2
    ",
    )
    .bind(author.id)
    .bind(recipes_limit.max(0))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let (recipes_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author.id)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(SubscriptionRead {
        author: UserRead::from(author),
        recipes,
        recipes_count,
    })
}

/// Authors the user follows.
pub async fn fetch_subscriptions(
    user_id: Id,
    page: PageRequest,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionRead>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            TRUE AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY f.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);

    let mut results = Vec::with_capacity(rows.len());
    for author in rows {
        results.push(get_subscription(author, recipes_limit, pool).await?);
    }

    Ok(PageContext::from_rows(results, total_count, page))
}

pub async fn follow_user(
    user_id: Id,
    author_id: Id,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionRead, Error> {
    if user_id == author_id {
        return Err(HtmlError::InvalidRequest.new("You cannot follow yourself"));
    }

    let author = get_user_row(author_id, Some(user_id), pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No user exists with specified id"))?;

    let result = sqlx::query(
        "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::InvalidRequest.new("You are already following this user"));
    }

    log::info!("User {user_id} now follows {author_id}");
    let author = UserRow {
        is_subscribed: true,
        ..author
    };
    get_subscription(author, recipes_limit, pool).await
}

pub async fn unfollow_user(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), Error> {
    if get_user_row(author_id, None, pool).await?.is_none() {
        return Err(HtmlError::NotFound.new("No user exists with specified id"));
    }

    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("You are not following this user"));
    }

    log::info!("User {user_id} no longer follows {author_id}");
    Ok(())
}
