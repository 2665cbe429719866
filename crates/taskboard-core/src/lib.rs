pub mod error;
pub mod page;
pub mod project;
pub mod query;
pub mod status;
pub mod task;
pub mod user;

pub use error::ValidationErrors;
pub use page::{PageLink, PageMetadata};
pub use project::Project;
pub use query::{ListConfig, QuerySpec, SortDirection};
pub use status::Status;
pub use task::Task;
pub use user::User;
