use sqlx::{Pool, Postgres};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    config::Config,
    error::{Error, HtmlError, QueryError},
    pagination::{PageContext, PageRequest},
    schema::{Id, User, UserRow},
    serializers::{UserPayload, UserRead},
};

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Creates a user; the password is stored as an argon2 hash.
pub async fn register_user(user: UserPayload, pool: &Pool<Postgres>) -> Result<User, Error> {
    let password = hash_password(&user.password).map_err(|e| {
        log::error!("Failed to hash password: {e}");
        HtmlError::InternalServerError.default()
    })?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(&user.email)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match row {
        Some(created) => {
            log::info!("Registered user {} ({})", created.username, created.id);
            Ok(created)
        }
        None => {
            let (username_taken,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                    .bind(&user.username)
                    .fetch_one(pool)
                    .await
                    .map_err(QueryError::from)?;

            Err(if username_taken {
                HtmlError::InvalidRequest
                    .new("A user with that username already exists.")
                    .on("username")
            } else {
                HtmlError::InvalidRequest
                    .new("A user with that email already exists.")
                    .on("email")
            })
        }
    }
}

/// Checks the credentials and issues a session token.
pub async fn login_user(
    email: &str,
    password: &str,
    config: &Config,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let invalid = || HtmlError::InvalidRequest.new("Unable to log in with provided credentials.");

    let user = get_user_by_email(pool, email).await?.ok_or_else(invalid)?;

    let authenticated = verify_password(password, &user.password).map_err(|e| {
        log::error!("Stored password hash of user {} is unreadable: {e}", user.id);
        HtmlError::InternalServerError.default()
    })?;
    if !authenticated {
        log::warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    generate_jwt_session(&user, &config.jwt_secret, config.session_hours)
}

/// `viewer` only drives `is_subscribed`; anonymous callers see it as false.
pub async fn fetch_users(
    viewer: Option<Id>,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRead>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM follows f WHERE f.user_id = $1 AND f.author_id = u.id) AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(rows, total_count, page).map(UserRead::from))
}

pub async fn get_user_row(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserRow>, Error> {
    let row: Option<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM follows f WHERE f.user_id = $2 AND f.author_id = u.id) AS is_subscribed,
            1::BIGINT AS count
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(id)
    .bind(viewer)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_read(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<UserRead, Error> {
    get_user_row(id, viewer, pool)
        .await?
        .map(UserRead::from)
        .ok_or_else(|| HtmlError::NotFound.new("No user exists with specified id"))
}
