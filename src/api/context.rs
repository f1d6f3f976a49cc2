use std::{convert::Infallible, sync::Arc};

use serde::de::DeserializeOwned;
use sqlx::{Pool, Postgres};
use warp::{Filter, Rejection};

use crate::{
    config::Config,
    constants::MAX_BODY_BYTES,
    error::Error,
    form::Form,
    pagination::PageRequest,
    storage::{ImageStore, MediaStorage},
};

/// Shared by every route. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub config: Arc<Config>,
    pub images: Arc<dyn ImageStore>,
}

impl Context {
    pub fn new(pool: Pool<Postgres>, config: Config) -> Self {
        let images = Arc::new(MediaStorage::from_config(&config));
        Self {
            pool,
            config: Arc::new(config),
            images,
        }
    }
}

pub fn with_context(
    context: Context,
) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || context.clone())
}

pub fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// `?page=&limit=`, falling back to the configured page size.
pub fn page_request(form: &Form, default_limit: i64) -> Result<PageRequest, Error> {
    Ok(PageRequest::new(
        form.get_number("page")?,
        form.get_number("limit")?,
        default_limit,
    ))
}
