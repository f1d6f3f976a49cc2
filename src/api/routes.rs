use std::convert::Infallible;

use warp::{
    filters::body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType,
    },
    reply, Filter, Rejection, Reply,
};

use crate::error::{Error, HtmlError};

use super::{admin, catalog, context::Context, recipes, users};

fn with_code(code: StatusCode, info: &str) -> Error {
    Error {
        code: code.as_u16(),
        info: Some(info.to_owned()),
        field: None,
    }
}

/// Renders every rejection as a JSON error body.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let error = if let Some(error) = err.find::<Error>() {
        error.clone()
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        HtmlError::InvalidRequest.new(&format!("Invalid JSON body: {e}"))
    } else if err.find::<InvalidQuery>().is_some() {
        HtmlError::InvalidRequest.new("Invalid query string")
    } else if err.find::<LengthRequired>().is_some() {
        with_code(StatusCode::LENGTH_REQUIRED, "Content-Length header is required")
    } else if err.find::<PayloadTooLarge>().is_some() {
        with_code(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large")
    } else if err.find::<UnsupportedMediaType>().is_some() {
        with_code(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Request body must be application/json",
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        with_code(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if err.is_not_found() {
        HtmlError::NotFound.default()
    } else {
        log::error!("Unhandled rejection: {err:?}");
        HtmlError::InternalServerError.default()
    };

    if error.code >= 500 {
        log::warn!("Request failed: {error}");
    }

    Ok(reply::with_status(reply::json(&error.body()), error.status()))
}

/// The whole service: the JSON API under `/api` and uploaded media under
/// `/media`.
pub fn routes(context: Context) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let api = users::routes(context.clone())
        .or(catalog::routes(context.clone()))
        .or(recipes::routes(context.clone()))
        .or(admin::routes(context.clone()));

    let media = warp::path("media").and(warp::fs::dir(context.config.media_root.clone()));

    warp::path("api")
        .and(api)
        .or(media)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}
