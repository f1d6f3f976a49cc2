use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use crate::{
    actions::{
        fetch_subscriptions, fetch_users, follow_user, get_user_read, login_user, register_user,
        unfollow_user,
    },
    constants::SESSION_COOKIE,
    error::Error,
    form::{Form, FormData},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    permissions::ActionType,
    schema::Id,
    serializers::{LoginPayload, TokenRead, UserCreated, UserPayload},
};

use super::context::{json_body, page_request, with_context, Context};

fn recipes_limit(form: &Form, default: i64) -> Result<i64, Error> {
    Ok(form
        .get_number::<i64>("recipes_limit")?
        .map(|limit| limit.max(0))
        .unwrap_or(default))
}

async fn handle_register(payload: UserPayload, context: Context) -> Result<impl Reply, Rejection> {
    let user = register_user(payload.validate()?, &context.pool).await?;

    Ok(reply::with_status(
        reply::json(&UserCreated::from(user)),
        StatusCode::CREATED,
    ))
}

async fn handle_login(payload: LoginPayload, context: Context) -> Result<impl Reply, Rejection> {
    let token = login_user(
        &payload.email,
        &payload.password,
        &context.config,
        &context.pool,
    )
    .await?;

    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        context.config.session_hours * 3600
    );

    Ok(reply::with_header(
        reply::json(&TokenRead { auth_token: token }),
        "set-cookie",
        cookie,
    ))
}

async fn handle_list_users(
    query: FormData,
    session: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(query);
    let page = page_request(&form, context.config.limits.page_size)?;

    let users = fetch_users(session.map(|s| s.user_id), page, &context.pool).await?;
    Ok(reply::json(&users))
}

async fn handle_me(session: SessionData, context: Context) -> Result<impl Reply, Rejection> {
    let user = get_user_read(session.user_id, Some(session.user_id), &context.pool).await?;
    Ok(reply::json(&user))
}

async fn handle_user_detail(
    id: Id,
    session: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let user = get_user_read(id, session.map(|s| s.user_id), &context.pool).await?;
    Ok(reply::json(&user))
}

async fn handle_subscriptions(
    query: FormData,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(query);
    let page = page_request(&form, context.config.limits.page_size)?;
    let limit = recipes_limit(&form, context.config.limits.recipes_limit)?;

    let subscriptions = fetch_subscriptions(session.user_id, page, limit, &context.pool).await?;
    Ok(reply::json(&subscriptions))
}

async fn handle_subscribe(
    id: Id,
    query: FormData,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    let limit = recipes_limit(
        &Form::from_data(query),
        context.config.limits.recipes_limit,
    )?;

    let subscription = follow_user(session.user_id, id, limit, &context.pool).await?;
    Ok(reply::with_status(
        reply::json(&subscription),
        StatusCode::CREATED,
    ))
}

async fn handle_unsubscribe(
    id: Id,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnRelations)?;
    unfollow_user(session.user_id, id, &context.pool).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let config = context.config.clone();

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body::<UserPayload>())
        .and(with_context(context.clone()))
        .and_then(handle_register);

    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body::<LoginPayload>())
        .and(with_context(context.clone()))
        .and_then(handle_login);

    let list = warp::path!("users")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_possible_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_me);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_subscriptions);

    let detail = warp::path!("users" / Id)
        .and(warp::get())
        .and(with_possible_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_user_detail);

    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(warp::query::<FormData>())
        .and(with_session(config.clone()))
        .and(with_context(context.clone()))
        .and_then(handle_subscribe);

    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(config))
        .and(with_context(context))
        .and_then(handle_unsubscribe);

    register
        .or(login)
        .or(list)
        .or(me)
        .or(subscriptions)
        .or(detail)
        .or(subscribe)
        .or(unsubscribe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_limit_falls_back_to_default() {
        let form = Form::from_data(vec![]);
        assert_eq!(recipes_limit(&form, 3).unwrap(), 3);

        let form = Form::from_data(vec![(String::from("recipes_limit"), String::from("1"))]);
        assert_eq!(recipes_limit(&form, 3).unwrap(), 1);

        let form = Form::from_data(vec![(String::from("recipes_limit"), String::from("-4"))]);
        assert_eq!(recipes_limit(&form, 3).unwrap(), 0);
    }
}
