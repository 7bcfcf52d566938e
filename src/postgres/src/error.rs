use hfp_core::{
    BoxedError,
    core_error::{TimeoutSnafu, UnexpectedSnafu},
};
use snafu::{IntoError, Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to connect to the database"))]
    Connection {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
    #[snafu(display("Failed to run migrations"))]
    Migration {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::migrate::MigrateError,
    },
    #[snafu(display("Failed a database query"))]
    Query {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection {
                error: sqlx::Error::PoolTimedOut,
                ..
            } | Error::Query {
                error: sqlx::Error::PoolTimedOut,
                ..
            }
        )
    }
}

impl From<Error> for hfp_core::Error {
    fn from(value: Error) -> Self {
        let timeout = value.is_timeout();
        let source: BoxedError = Box::new(value);

        if timeout {
            TimeoutSnafu.into_error(source)
        } else {
            UnexpectedSnafu.into_error(source)
        }
    }
}
