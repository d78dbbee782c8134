use std::time::Duration;

use actix_web::web;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use failsafe::backoff::EqualJittered;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::{CircuitBreaker, StateMachine};

use crate::config::Config;
use crate::error::ServiceError;

pub(crate) type DbPool = r2d2::Pool<ConnectionManager<MysqlConnection>>;

pub(crate) type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

const CONNECTION_TIMEOUT_SECONDS: u64 = 5;

/// Pooled MySQL access behind a circuit breaker.
#[derive(Clone)]
pub(crate) struct Database {
    pool: DbPool,
    circuit_breaker: CircuitBreakerType,
}

impl Database {
    pub(crate) fn connect(config: &Config) -> Result<Self, r2d2::PoolError> {
        let manager = ConnectionManager::<MysqlConnection>::new(config.database_url.as_str());
        let pool = r2d2::Pool::builder()
            .max_size(config.db_pool_max_size)
            .connection_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECONDS))
            .build(manager)?;
        Ok(Database::new(pool, failsafe::Config::new().build()))
    }

    pub(crate) fn new(pool: DbPool, circuit_breaker: CircuitBreakerType) -> Self {
        Database {
            pool,
            circuit_breaker,
        }
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    pub(crate) async fn run<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&MysqlConnection) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        web::block(move || db.run_blocking(f)).await?
    }

    pub(crate) fn run_blocking<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&MysqlConnection) -> Result<T, ServiceError>,
    {
        //first check if circuit breaker is permitted
        if !self.circuit_breaker.is_call_permitted() {
            return Err(ServiceError::Unavailable);
        }
        let pool = &self.pool;
        self.circuit_breaker
            .call_with(
                |e: &ServiceError| e.is_infrastructure(),
                || {
                    let conn = pool.get()?;
                    f(&conn)
                },
            )
            .map_err(ServiceError::from)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A database handle whose pool never opens a connection until asked.
    pub(crate) fn unreachable_database() -> Database {
        let manager = ConnectionManager::<MysqlConnection>::new("mysql://nobody@127.0.0.1:1/menu");
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager);
        Database::new(pool, failsafe::Config::new().build())
    }

    #[test]
    fn pool_failures_surface_as_service_errors() {
        let db = unreachable_database();
        let err = db.run_blocking(|_conn| Ok(())).unwrap_err();
        assert!(matches!(err, ServiceError::Pool(_) | ServiceError::Unavailable));
    }
}
