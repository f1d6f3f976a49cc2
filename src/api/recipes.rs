use warp::{
    http::StatusCode,
    reply::{self, Response},
    Filter, Rejection, Reply,
};

use crate::{
    actions::{
        add_recipe_relation, create_recipe, delete_recipe, fetch_recipes, get_recipe_mut,
        get_recipe_read, remove_recipe_relation, shopping_list, update_recipe, RecipeFilter,
        RecipeRelation,
    },
    constants::SHOPPING_LIST_FILENAME,
    error::{Error, HtmlError},
    form::{Form, FormData},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    permissions::ActionType,
    schema::Id,
    serializers::{RecipeDraft, RecipePayload, RecipeRead},
};

use super::context::{json_body, page_request, with_context, Context};

/// One recipe request, resolved from method and path.
#[derive(Debug, Clone)]
pub enum RecipeOperation {
    Read { id: Id },
    Create { payload: RecipePayload },
    Update { id: Id, payload: RecipePayload },
    Delete { id: Id },
}

#[derive(Debug, Clone)]
pub enum RecipeOutcome {
    Found(RecipeRead),
    Created(RecipeRead),
    Updated(RecipeRead),
    Deleted,
}

impl Reply for RecipeOutcome {
    fn into_response(self) -> Response {
        match self {
            RecipeOutcome::Found(recipe) | RecipeOutcome::Updated(recipe) => {
                reply::json(&recipe).into_response()
            }
            RecipeOutcome::Created(recipe) => {
                reply::with_status(reply::json(&recipe), StatusCode::CREATED).into_response()
            }
            RecipeOutcome::Deleted => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn require_session(session: Option<&SessionData>) -> Result<&SessionData, Error> {
    session.ok_or_else(|| HtmlError::Unauthorized.default())
}

/// Swaps the client supplied image for the stored reference. Resending the
/// recipe's `current` reference keeps that image. The second value is the
/// image written by this call, if any.
async fn store_image(
    mut draft: RecipeDraft,
    current: Option<&str>,
    context: &Context,
) -> Result<(RecipeDraft, Option<String>), Error> {
    let stored = match draft.image.take() {
        Some(image) if Some(image.as_str()) == current => None,
        Some(image) => Some(context.images.save(&image).await?),
        None => None,
    };
    draft.image = stored.clone();

    Ok((draft, stored))
}

async fn discard_image(reference: Option<&str>, context: &Context) {
    if let Some(reference) = reference {
        if let Err(e) = context.images.remove(reference).await {
            log::warn!("Could not remove image {reference}: {e}");
        }
    }
}

async fn read_back(id: Id, viewer: Id, context: &Context) -> Result<RecipeRead, Error> {
    get_recipe_read(id, Some(viewer), &context.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))
}

impl RecipeOperation {
    pub async fn run(
        self,
        session: Option<&SessionData>,
        context: &Context,
    ) -> Result<RecipeOutcome, Error> {
        let limits = &context.config.limits;

        match self {
            RecipeOperation::Read { id } => {
                let viewer = session.map(|s| s.user_id);
                get_recipe_read(id, viewer, &context.pool)
                    .await?
                    .map(RecipeOutcome::Found)
                    .ok_or_else(|| HtmlError::NotFound.new("No recipe exists with specified id"))
            }
            RecipeOperation::Create { payload } => {
                let session = require_session(session)?;
                session.authenticate(ActionType::CreateRecipes)?;

                let (draft, stored) =
                    store_image(payload.validate(limits, true)?, None, context).await?;
                let id = match create_recipe(session.user_id, &draft, limits, &context.pool).await
                {
                    Ok(id) => id,
                    Err(e) => {
                        discard_image(stored.as_deref(), context).await;
                        return Err(e);
                    }
                };

                Ok(RecipeOutcome::Created(
                    read_back(id, session.user_id, context).await?,
                ))
            }
            RecipeOperation::Update { id, payload } => {
                let session = require_session(session)?;
                let recipe = get_recipe_mut(id, session, &context.pool).await?;

                let (draft, stored) = store_image(
                    payload.validate(limits, false)?,
                    Some(&recipe.image),
                    context,
                )
                .await?;
                if let Err(e) = update_recipe(recipe.id, &draft, limits, &context.pool).await {
                    discard_image(stored.as_deref(), context).await;
                    return Err(e);
                }
                if stored.is_some() {
                    discard_image(Some(&recipe.image), context).await;
                }

                Ok(RecipeOutcome::Updated(
                    read_back(recipe.id, session.user_id, context).await?,
                ))
            }
            RecipeOperation::Delete { id } => {
                let session = require_session(session)?;
                let recipe = get_recipe_mut(id, session, &context.pool).await?;

                delete_recipe(recipe.id, &context.pool).await?;
                discard_image(Some(&recipe.image), context).await;
                Ok(RecipeOutcome::Deleted)
            }
        }
    }
}

fn recipe_filter(form: &Form) -> Result<RecipeFilter, Error> {
    Ok(RecipeFilter {
        author: form.get_number("author")?,
        tags: form.get_all("tags"),
        is_favorited: form.get_flag("is_favorited"),
        is_in_shopping_cart: form.get_flag("is_in_shopping_cart"),
    })
}

async fn handle_recipe_operation(
    session: Option<SessionData>,
    operation: RecipeOperation,
    context: Context,
) -> Result<RecipeOutcome, Rejection> {
    Ok(operation.run(session.as_ref(), &context).await?)
}

async fn handle_list_recipes(
    query: FormData,
    session: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(query);
    let filter = recipe_filter(&form)?;
    let page = page_request(&form, context.config.limits.page_size)?;

    let recipes = fetch_recipes(
        &filter,
        session.map(|s| s.user_id),
        page,
        &context.pool,
    )
    .await?;

    Ok(reply::json(&recipes))
}

async fn handle_add_relation(
    id: Id,
    session: SessionData,
    relation: RecipeRelation,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    let recipe = add_recipe_relation(relation, id, session.user_id, &context.pool).await?;

    Ok(reply::with_status(reply::json(&recipe), StatusCode::CREATED))
}

async fn handle_remove_relation(
    id: Id,
    session: SessionData,
    relation: RecipeRelation,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    remove_recipe_relation(relation, id, session.user_id, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn handle_download_shopping_cart(
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let list = shopping_list(session.user_id, &context.pool).await?;
    log::info!("User {} downloaded a shopping list", session.user_id);

    let body = reply::with_header(
        String::from(list),
        "content-type",
        "text/plain; charset=utf-8",
    );
    Ok(reply::with_header(
        body,
        "content-disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    ))
}

fn relation_routes(
    relation: RecipeRelation,
    segment: &'static str,
    context: Context,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let path = warp::path("recipes")
        .and(warp::path::param::<Id>())
        .and(warp::path(segment))
        .and(warp::path::end());
    let relation = warp::any().map(move || relation);

    let add = path
        .clone()
        .and(warp::post())
        .and(with_session(context.config.clone()))
        .and(relation.clone())
        .and(with_context(context.clone()))
        .and_then(handle_add_relation);

    let remove = path
        .and(warp::delete())
        .and(with_session(context.config.clone()))
        .and(relation)
        .and(with_context(context))
        .and_then(handle_remove_relation);

    add.or(remove)
}

pub fn routes(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let config = context.config.clone();

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_download_shopping_cart);

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_possible_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_list_recipes);

    let read = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(config.clone()))
        .map(|id: Id, session: Option<SessionData>| (session, RecipeOperation::Read { id }))
        .untuple_one();

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(config.clone()))
        .and(json_body::<RecipePayload>())
        .map(|session: SessionData, payload: RecipePayload| {
            (Some(session), RecipeOperation::Create { payload })
        })
        .untuple_one();

    let update = warp::path!("recipes" / Id)
        .and(warp::patch().or(warp::put()).unify())
        .and(with_session(config.clone()))
        .and(json_body::<RecipePayload>())
        .map(|id: Id, session: SessionData, payload: RecipePayload| {
            (Some(session), RecipeOperation::Update { id, payload })
        })
        .untuple_one();

    let delete = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_session(config))
        .map(|id: Id, session: SessionData| (Some(session), RecipeOperation::Delete { id }))
        .untuple_one();

    let operations = read
        .or(create)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .and(with_context(context.clone()))
        .and_then(handle_recipe_operation);

    download
        .or(list)
        .or(operations)
        .or(relation_routes(RecipeRelation::Favorite, "favorite", context.clone()))
        .or(relation_routes(RecipeRelation::ShoppingCart, "shopping_cart", context))
}
