use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use crate::{
    config::Config,
    constants::SESSION_COOKIE,
    database::error::HtmlError,
};

use super::jwt::{verify_jwt_session, SessionData};

/// Token from `Authorization: Token <jwt>` (or `Bearer`), falling back to the
/// session cookie.
pub fn session_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .map(|header: Option<String>, cookie: Option<String>| {
            header
                .as_deref()
                .and_then(|value| {
                    value
                        .strip_prefix("Token ")
                        .or_else(|| value.strip_prefix("Bearer "))
                })
                .map(|token| token.trim().to_owned())
                .filter(|token| !token.is_empty())
                .or(cookie)
        })
}

pub fn with_session(
    config: Arc<Config>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    session_token().and_then(move |token: Option<String>| {
        let config = config.clone();
        async move {
            let token = token.ok_or_else(|| HtmlError::Unauthorized.default())?;
            let session = verify_jwt_session(&token, &config.jwt_secret)?;
            Ok::<SessionData, Rejection>(session.into())
        }
    })
}

/// Anonymous callers pass through as `None`. A token that is present but
/// invalid is still rejected.
pub fn with_possible_session(
    config: Arc<Config>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    session_token().and_then(move |token: Option<String>| {
        let config = config.clone();
        async move {
            match token {
                Some(token) => {
                    let session = verify_jwt_session(&token, &config.jwt_secret)?;
                    Ok::<Option<SessionData>, Rejection>(Some(session.into()))
                }
                None => Ok(None),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Limits,
        jwt::generate_jwt_session,
        schema::{User, UserRole},
    };

    fn config() -> Arc<Config> {
        Arc::new(Config {
            database_url: String::from("postgres://localhost/foodgram"),
            bind_address: ([127, 0, 0, 1], 8000).into(),
            jwt_secret: String::from("test-secret"),
            session_hours: 1,
            media_root: "media".into(),
            media_url: String::from("/media/"),
            max_connections: 1,
            limits: Limits::default(),
        })
    }

    fn token() -> String {
        let user = User {
            id: 5,
            email: String::from("cook@example.com"),
            username: String::from("cook"),
            first_name: String::from("Ada"),
            last_name: String::from("Cook"),
            password: String::new(),
            role: UserRole::User,
        };
        generate_jwt_session(&user, "test-secret", 1).unwrap()
    }

    #[tokio::test]
    async fn token_header_is_accepted() {
        let session = warp::test::request()
            .header("authorization", format!("Token {}", token()))
            .filter(&with_session(config()))
            .await
            .unwrap();

        assert_eq!(session.user_id, 5);
    }

    #[tokio::test]
    async fn session_cookie_is_accepted() {
        let session = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}={}", token()))
            .filter(&with_session(config()))
            .await
            .unwrap();

        assert_eq!(session.username, "cook");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let result = warp::test::request()
            .filter(&with_session(config()))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn anonymous_caller_has_no_session() {
        let session = warp::test::request()
            .filter(&with_possible_session(config()))
            .await
            .unwrap();

        assert!(session.is_none());
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_even_when_optional() {
        let result = warp::test::request()
            .header("authorization", "Token not-a-token")
            .filter(&with_possible_session(config()))
            .await;

        assert!(result.is_err());
    }
}
