use async_trait::async_trait;
use thiserror::Error;

use taskboard_core::project::{CreateProject, Project, UpdateProject};
use taskboard_core::query::QuerySpec;
use taskboard_core::task::{CreateTask, Task, TaskView, UpdateTask};
use taskboard_core::user::{CreateUser, UpdateUser, User};
use taskboard_core::ValidationErrors;
use taskboard_db::PageResult;

use crate::attachments::{ImageChange, UploadedFile};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<taskboard_db::DbError> for ServiceError {
    fn from(e: taskboard_db::DbError) -> Self {
        match e {
            taskboard_db::DbError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

/// Abstraction over the admin operations the HTTP layer programs against.
///
/// Every list operation takes an already-decoded [`QuerySpec`]; malformed
/// query input never reaches this layer. Mutations taking an image accept
/// the upload alongside the field payload so a storage write failure can
/// fail the whole mutation.
#[async_trait]
pub trait AdminService: Send + Sync {
    // -- Projects --
    async fn list_projects(&self, spec: &QuerySpec) -> Result<PageResult<Project>, ServiceError>;
    async fn get_project(&self, id: &str) -> Result<Project, ServiceError>;
    async fn create_project(
        &self,
        input: &CreateProject,
        image: Option<&UploadedFile>,
    ) -> Result<Project, ServiceError>;
    async fn update_project(
        &self,
        id: &str,
        update: &UpdateProject,
        image: ImageChange<'_>,
    ) -> Result<Project, ServiceError>;
    async fn delete_project(&self, id: &str) -> Result<(), ServiceError>;
    async fn list_project_tasks(
        &self,
        project_id: &str,
        spec: &QuerySpec,
    ) -> Result<PageResult<TaskView>, ServiceError>;

    // -- Tasks --
    async fn list_tasks(&self, spec: &QuerySpec) -> Result<PageResult<TaskView>, ServiceError>;
    async fn get_task(&self, id: &str) -> Result<TaskView, ServiceError>;
    async fn create_task(
        &self,
        input: &CreateTask,
        image: Option<&UploadedFile>,
    ) -> Result<Task, ServiceError>;
    async fn update_task(
        &self,
        id: &str,
        update: &UpdateTask,
        image: ImageChange<'_>,
    ) -> Result<Task, ServiceError>;
    async fn delete_task(&self, id: &str) -> Result<(), ServiceError>;

    // -- Users --
    async fn list_users(&self, spec: &QuerySpec) -> Result<PageResult<User>, ServiceError>;
    async fn get_user(&self, id: &str) -> Result<User, ServiceError>;
    async fn create_user(&self, input: &CreateUser) -> Result<User, ServiceError>;
    async fn update_user(&self, id: &str, update: &UpdateUser) -> Result<User, ServiceError>;
    async fn delete_user(&self, id: &str) -> Result<(), ServiceError>;
}
