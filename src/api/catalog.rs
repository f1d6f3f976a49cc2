use warp::{reply, Filter, Rejection, Reply};

use crate::{
    actions::{get_ingredient, get_tag, list_ingredients, list_tags},
    error::HtmlError,
    form::{Form, FormData},
    schema::Id,
};

use super::context::{with_context, Context};

async fn handle_list_ingredients(
    query: FormData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(query);
    let ingredients = list_ingredients(form.get_str("name"), &context.pool).await?;

    Ok(reply::json(&ingredients))
}

async fn handle_ingredient(id: Id, context: Context) -> Result<impl Reply, Rejection> {
    let ingredient = get_ingredient(id, &context.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No ingredient exists with specified id"))?;

    Ok(reply::json(&ingredient))
}

async fn handle_list_tags(context: Context) -> Result<impl Reply, Rejection> {
    let tags = list_tags(&context.pool).await?;
    Ok(reply::json(&tags))
}

async fn handle_tag(id: Id, context: Context) -> Result<impl Reply, Rejection> {
    let tag = get_tag(id, &context.pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("No tag exists with specified id"))?;

    Ok(reply::json(&tag))
}

/// Read-only and public.
pub fn routes(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_context(context.clone()))
        .and_then(handle_list_ingredients);

    let ingredient = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_context(context.clone()))
        .and_then(handle_ingredient);

    let tags = warp::path!("tags")
        .and(warp::get())
        .and(with_context(context.clone()))
        .and_then(handle_list_tags);

    let tag = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_context(context))
        .and_then(handle_tag);

    ingredients.or(ingredient).or(tags).or(tag)
}
