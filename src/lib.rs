mod database {
    pub mod actions;
    pub mod error;
    pub mod export;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod serializers;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod api {
    pub mod admin;
    pub mod catalog;
    pub mod context;
    pub mod recipes;
    pub mod routes;
    pub mod users;

    pub use context::Context;
    pub use routes::{handle_rejection, routes};
}
pub mod config;
mod constants;
pub mod storage;

pub use authentication::*;
pub use constants::*;
pub use database::*;
