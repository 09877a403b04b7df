pub mod errors;
pub mod model;
pub mod repository;
pub mod repository_sqlx;

pub use errors::{FieldError, PersistError, RowError};
pub use model::Tick;
pub use repository::TickRepository;
pub use repository_sqlx::SqlxTickRepository;
