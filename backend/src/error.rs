use thiserror::Error;

/// Startup failures. Any of these stops the process before the loop runs.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("invalid database identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl ProvisionError {
    pub fn step(step: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Step { step, source }
    }
}
