use thiserror::Error;

/// Failure to bring up, or talk to, a throwaway Redis container.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("redis container is not usable: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("cannot open a client for the redis container: {0}")]
    Client(#[from] redis::RedisError),
}

pub type Result<T, E = TestInfraError> = std::result::Result<T, E>;
