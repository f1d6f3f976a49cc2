use serde::Serialize;
use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use crate::{
    actions::{create_ingredient, create_tag, delete_ingredient, delete_tag},
    jwt::SessionData,
    middleware::with_session,
    permissions::ActionType,
    schema::Id,
    serializers::{IngredientPayload, TagPayload},
};

use super::context::{json_body, with_context, Context};

/// How a model is presented to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelRegistration {
    pub model: &'static str,
    pub list_display: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub ordering: &'static [&'static str],
}

pub const REGISTRY: &[ModelRegistration] = &[
    ModelRegistration {
        model: "user",
        list_display: &["first_name", "last_name", "username", "email"],
        search_fields: &["username", "email"],
        list_filter: &[],
        ordering: &["id"],
    },
    ModelRegistration {
        model: "follow",
        list_display: &["author", "user"],
        search_fields: &[
            "author__username",
            "author__email",
            "user__username",
            "user__email",
        ],
        list_filter: &[],
        ordering: &["id"],
    },
    ModelRegistration {
        model: "ingredient",
        list_display: &["name", "measurement_unit"],
        search_fields: &["name"],
        list_filter: &["name"],
        ordering: &["name"],
    },
    ModelRegistration {
        model: "tag",
        list_display: &["name", "color", "slug"],
        search_fields: &["name"],
        list_filter: &[],
        ordering: &["name"],
    },
    ModelRegistration {
        model: "recipe",
        list_display: &["id", "author", "name", "tags", "favorites_count"],
        search_fields: &["name", "author__username", "author__email", "tags__name"],
        list_filter: &["tags", "author", "name"],
        ordering: &["name"],
    },
    ModelRegistration {
        model: "favorite",
        list_display: &["recipe", "user"],
        search_fields: &["recipe__name", "user__username", "user__email"],
        list_filter: &[],
        ordering: &["id"],
    },
    ModelRegistration {
        model: "cart",
        list_display: &["recipe", "user"],
        search_fields: &["user__username", "user__email"],
        list_filter: &[],
        ordering: &["id"],
    },
];

async fn handle_registry(session: SessionData) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;
    Ok(reply::json(&REGISTRY))
}

async fn handle_create_ingredient(
    session: SessionData,
    payload: IngredientPayload,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;
    let ingredient = create_ingredient(payload.validate()?, &context.pool).await?;

    Ok(reply::with_status(
        reply::json(&ingredient),
        StatusCode::CREATED,
    ))
}

async fn handle_delete_ingredient(
    id: Id,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;
    delete_ingredient(id, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn handle_create_tag(
    session: SessionData,
    payload: TagPayload,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;
    let tag = create_tag(payload.validate()?, &context.pool).await?;

    Ok(reply::with_status(reply::json(&tag), StatusCode::CREATED))
}

async fn handle_delete_tag(
    id: Id,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageCatalog)?;
    delete_tag(id, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let config = context.config.clone();

    let registry = warp::path!("admin" / "registry")
        .and(warp::get())
        .and(with_session(config.clone()))
        .and_then(handle_registry);

    let add_ingredient = warp::path!("admin" / "ingredients")
        .and(warp::post())
        .and(with_session(config.clone()))
        .and(json_body::<IngredientPayload>())
        .and(with_context(context.clone()))
        .and_then(handle_create_ingredient);

    let remove_ingredient = warp::path!("admin" / "ingredients" / Id)
        .and(warp::delete())
        .and(with_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_delete_ingredient);

    let add_tag = warp::path!("admin" / "tags")
        .and(warp::post())
        .and(with_session(config.clone()))
        .and(json_body::<TagPayload>())
        .and(with_context(context.clone()))
        .and_then(handle_create_tag);

    let remove_tag = warp::path!("admin" / "tags" / Id)
        .and(warp::delete())
        .and(with_session(config))
        .and(with_context(context))
        .and_then(handle_delete_tag);

    registry
        .or(add_ingredient)
        .or(remove_ingredient)
        .or(add_tag)
        .or(remove_tag)
}
