use std::fmt::{self, Display};

use warp::http::StatusCode;

/// Error returned by every action and handler. Carries the HTTP status it
/// should be rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
    pub field: Option<String>,
}

impl Error {
    /// Attaches the payload field the message is about.
    pub fn on(mut self, field: &str) -> Self {
        self.field = Some(field.to_owned());
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn body(&self) -> serde_json::Value {
        let info = self.info.clone().unwrap_or_else(|| {
            self.status()
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned()
        });

        match &self.field {
            Some(field) => serde_json::json!({ field.as_str(): [info] }),
            None => serde_json::json!({ "errors": info }),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.field, &self.info) {
            (Some(field), Some(info)) => write!(f, "{} {field}: {info}", self.code),
            (None, Some(info)) => write!(f, "{} {info}", self.code),
            _ => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for Error {}

impl warp::reject::Reject for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlError {
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl HtmlError {
    pub fn code(self) -> u16 {
        match self {
            HtmlError::InvalidRequest => 400,
            HtmlError::Unauthorized => 401,
            HtmlError::Forbidden => 403,
            HtmlError::NotFound => 404,
            HtmlError::InternalServerError => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_owned()),
            field: None,
        }
    }

    pub fn default(self) -> Error {
        let info = match self {
            HtmlError::InvalidRequest => "Invalid request",
            HtmlError::Unauthorized => "Authentication credentials were not provided",
            HtmlError::Forbidden => "You do not have permission to perform this action",
            HtmlError::NotFound => "Not found",
            HtmlError::InternalServerError => "Internal server error",
        };
        self.new(info)
    }
}

// Postgres SQLSTATE codes for the constraints the schema declares.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug)]
pub struct QueryError {
    code: u16,
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { code: 500, info }
    }

    fn rejected(info: &str) -> Self {
        Self {
            code: 400,
            info: info.to_owned(),
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => match e.code().as_deref() {
                Some(UNIQUE_VIOLATION) => Self::rejected("Object already exists"),
                Some(FOREIGN_KEY_VIOLATION) => Self::rejected("Referenced object does not exist"),
                Some(CHECK_VIOLATION) => Self::rejected("Value is out of the allowed range"),
                _ => Self::new(format!("{e}")),
            },
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new("RowNotFound".to_owned()),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(e),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new("Pool timed out".to_owned()),
            sqlx::Error::PoolClosed => Self::new("Pool closed".to_owned()),
            sqlx::Error::WorkerCrashed => Self::new("Worker crashed".to_owned()),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new("Unknown error".to_owned()),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        if value.code >= 500 {
            log::error!("Query failed: {}", value.info);
            return HtmlError::InternalServerError.default();
        }

        Error {
            code: value.code,
            info: Some(value.info),
            field: None,
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HtmlError::InvalidRequest.new(&value.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_render_as_lists() {
        let err = HtmlError::InvalidRequest
            .new("Ensure this value is greater than or equal to 1")
            .on("cooking_time");

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(),
            serde_json::json!({ "cooking_time": ["Ensure this value is greater than or equal to 1"] })
        );
    }

    #[test]
    fn plain_errors_render_under_errors_key() {
        let err = HtmlError::NotFound.default();

        assert_eq!(err.code, 404);
        assert_eq!(err.body(), serde_json::json!({ "errors": "Not found" }));
    }

    #[test]
    fn internal_query_errors_hide_their_cause() {
        let err: Error = QueryError::new("connection reset by peer".to_owned()).into();

        assert_eq!(err.code, 500);
        assert_eq!(err.info.as_deref(), Some("Internal server error"));
    }

    #[test]
    fn row_not_found_is_internal() {
        let err: Error = QueryError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
