use std::sync::Arc;

use async_trait::async_trait;

use taskboard_core::project::{CreateProject, Project, UpdateProject};
use taskboard_core::query::QuerySpec;
use taskboard_core::task::{CreateTask, Task, TaskView, UpdateTask};
use taskboard_core::user::{CreateUser, UpdateUser, User};
use taskboard_core::ValidationErrors;
use taskboard_db::{Db, PageResult};
use taskboard_store::ObjectStore;

use crate::attachments::{AttachmentManager, ImageChange, UploadedFile};
use crate::{AdminService, ServiceError};

/// Service implementation backed by direct SQLite access and a local or
/// injected blob store.
pub struct LocalService {
    db: Db,
    project_images: AttachmentManager,
    task_images: AttachmentManager,
}

impl LocalService {
    pub fn new(db: Db, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            db,
            project_images: AttachmentManager::new(store.clone(), "projects"),
            task_images: AttachmentManager::new(store, "tasks"),
        }
    }

    fn validate_project_create(&self, input: &CreateProject) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "name", &input.name);
        if let Some(uid) = &input.created_by {
            if self.db.get_user_opt(uid)?.is_none() {
                errors.add("created_by", "is not a known user");
            }
        }
        Ok(errors.into_result(())?)
    }

    fn validate_project_update(&self, update: &UpdateProject) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &update.name {
            require(&mut errors, "name", name);
        }
        Ok(errors.into_result(())?)
    }

    fn validate_task_create(&self, input: &CreateTask) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "title", &input.title);
        if self.db.get_project(&input.project_id).is_err() {
            errors.add("project_id", "is not a known project");
        }
        if let Some(uid) = &input.assigned_to {
            if self.db.get_user_opt(uid)?.is_none() {
                errors.add("assigned_to", "is not a known user");
            }
        }
        Ok(errors.into_result(())?)
    }

    fn validate_task_update(&self, update: &UpdateTask) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &update.title {
            require(&mut errors, "title", title);
        }
        if let Some(Some(uid)) = &update.assigned_to {
            if self.db.get_user_opt(uid)?.is_none() {
                errors.add("assigned_to", "is not a known user");
            }
        }
        Ok(errors.into_result(())?)
    }

    fn validate_user(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        own_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = name {
            require(&mut errors, "name", name);
        }
        if let Some(email) = email {
            if email.trim().is_empty() {
                errors.add("email", "is required");
            } else if !email.contains('@') {
                errors.add("email", "is not a valid email address");
            } else if let Some(existing) = self.db.find_user_by_email(email)? {
                if own_id != Some(existing.id.as_str()) {
                    errors.add("email", "is already taken");
                }
            }
        }
        Ok(errors.into_result(())?)
    }

    fn task_view(&self, task: Task) -> Result<TaskView, ServiceError> {
        // Weak reference: a dangling assignee id resolves to no name,
        // never to an error.
        let assigned_user_name = match task.assigned_to.as_deref() {
            Some(uid) => self.db.get_user_opt(uid)?.map(|u| u.name),
            None => None,
        };
        Ok(TaskView {
            task,
            assigned_user_name,
        })
    }

    fn task_views(&self, page: PageResult<Task>) -> Result<PageResult<TaskView>, ServiceError> {
        let mut rows = Vec::with_capacity(page.rows.len());
        for task in page.rows {
            rows.push(self.task_view(task)?);
        }
        Ok(PageResult {
            rows,
            current_page: page.current_page,
            last_page: page.last_page,
            total: page.total,
            per_page: page.per_page,
        })
    }

    /// Shared update path for the attachment: write the new blob, point
    /// the record at it, and only then delete the old one. On a record
    /// write failure the fresh blob is rolled back best-effort.
    async fn apply_image_change(
        &self,
        manager: &AttachmentManager,
        old_key: Option<String>,
        change: ImageChange<'_>,
        point_record: impl FnOnce(Option<&str>) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        match change {
            ImageChange::Keep => Ok(()),
            ImageChange::Remove => {
                point_record(None)?;
                if let Some(old) = old_key {
                    manager.remove(&old).await;
                }
                Ok(())
            }
            ImageChange::Upload(file) => {
                let new_key = manager.assign(file).await?;
                if let Err(e) = point_record(Some(&new_key)) {
                    manager.remove(&new_key).await;
                    return Err(e);
                }
                if let Some(old) = old_key {
                    manager.remove(&old).await;
                }
                Ok(())
            }
        }
    }
}

fn require(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    } else if value.len() > 255 {
        errors.add(field, "must be at most 255 characters");
    }
}

#[async_trait]
impl AdminService for LocalService {
    async fn list_projects(&self, spec: &QuerySpec) -> Result<PageResult<Project>, ServiceError> {
        Ok(self.db.list_projects(spec)?)
    }

    async fn get_project(&self, id: &str) -> Result<Project, ServiceError> {
        Ok(self.db.get_project(id)?)
    }

    async fn create_project(
        &self,
        input: &CreateProject,
        image: Option<&UploadedFile>,
    ) -> Result<Project, ServiceError> {
        self.validate_project_create(input)?;
        let image_key = match image {
            Some(file) => Some(self.project_images.assign(file).await?),
            None => None,
        };
        match self.db.create_project(input, image_key.as_deref()) {
            Ok(project) => Ok(project),
            Err(e) => {
                // The record never existed, so the fresh blob is garbage.
                if let Some(key) = image_key {
                    self.project_images.remove(&key).await;
                }
                Err(e.into())
            }
        }
    }

    async fn update_project(
        &self,
        id: &str,
        update: &UpdateProject,
        image: ImageChange<'_>,
    ) -> Result<Project, ServiceError> {
        let existing = self.db.get_project(id)?;
        self.validate_project_update(update)?;
        self.db.update_project(id, update)?;
        self.apply_image_change(&self.project_images, existing.image_path, image, |key| {
            Ok(self.db.set_project_image(id, key)?)
        })
        .await?;
        Ok(self.db.get_project(id)?)
    }

    async fn delete_project(&self, id: &str) -> Result<(), ServiceError> {
        // Explicit cascade policy: a project owns its tasks, so they are
        // deleted with it, together with every orphaned blob.
        let orphaned = self.db.project_image_keys(id)?;
        self.db.delete_project(id)?;
        for key in orphaned {
            if key.starts_with("tasks/") {
                self.task_images.remove(&key).await;
            } else {
                self.project_images.remove(&key).await;
            }
        }
        Ok(())
    }

    async fn list_project_tasks(
        &self,
        project_id: &str,
        spec: &QuerySpec,
    ) -> Result<PageResult<TaskView>, ServiceError> {
        self.db.get_project(project_id)?;
        let page = self.db.list_project_tasks(project_id, spec)?;
        self.task_views(page)
    }

    async fn list_tasks(&self, spec: &QuerySpec) -> Result<PageResult<TaskView>, ServiceError> {
        let page = self.db.list_tasks(spec)?;
        self.task_views(page)
    }

    async fn get_task(&self, id: &str) -> Result<TaskView, ServiceError> {
        let task = self.db.get_task(id)?;
        self.task_view(task)
    }

    async fn create_task(
        &self,
        input: &CreateTask,
        image: Option<&UploadedFile>,
    ) -> Result<Task, ServiceError> {
        self.validate_task_create(input)?;
        let image_key = match image {
            Some(file) => Some(self.task_images.assign(file).await?),
            None => None,
        };
        match self.db.create_task(input, image_key.as_deref()) {
            Ok(task) => Ok(task),
            Err(e) => {
                if let Some(key) = image_key {
                    self.task_images.remove(&key).await;
                }
                Err(e.into())
            }
        }
    }

    async fn update_task(
        &self,
        id: &str,
        update: &UpdateTask,
        image: ImageChange<'_>,
    ) -> Result<Task, ServiceError> {
        let existing = self.db.get_task(id)?;
        self.validate_task_update(update)?;
        self.db.update_task(id, update)?;
        self.apply_image_change(&self.task_images, existing.image_path, image, |key| {
            Ok(self.db.set_task_image(id, key)?)
        })
        .await?;
        Ok(self.db.get_task(id)?)
    }

    async fn delete_task(&self, id: &str) -> Result<(), ServiceError> {
        let existing = self.db.get_task(id)?;
        self.db.delete_task(id)?;
        if let Some(key) = existing.image_path {
            self.task_images.remove(&key).await;
        }
        Ok(())
    }

    async fn list_users(&self, spec: &QuerySpec) -> Result<PageResult<User>, ServiceError> {
        Ok(self.db.list_users(spec)?)
    }

    async fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        Ok(self.db.get_user(id)?)
    }

    async fn create_user(&self, input: &CreateUser) -> Result<User, ServiceError> {
        self.validate_user(Some(&input.name), Some(&input.email), None)?;
        Ok(self.db.create_user(input)?)
    }

    async fn update_user(&self, id: &str, update: &UpdateUser) -> Result<User, ServiceError> {
        self.db.get_user(id)?;
        self.validate_user(update.name.as_deref(), update.email.as_deref(), Some(id))?;
        Ok(self.db.update_user(id, update)?)
    }

    async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.db.delete_user(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;
    use taskboard_core::status::Status;
    use taskboard_store::{LocalStore, StoreConfig, StoreError};

    fn service() -> (LocalService, Arc<dyn ObjectStore>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(&StoreConfig {
            data_dir: Some(tmp.path().to_string_lossy().to_string()),
        }));
        let db = Db::open_in_memory().unwrap();
        (LocalService::new(db, store.clone()), store, tmp)
    }

    fn project_input(name: &str) -> CreateProject {
        CreateProject {
            name: name.into(),
            description: String::new(),
            status: Status::Pending,
            due_date: None,
            created_by: None,
        }
    }

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.into(),
            bytes: Bytes::from_static(b"fake png"),
        }
    }

    /// Store whose writes always fail; deletes succeed.
    struct BrokenStore;

    #[async_trait]
    impl ObjectStore for BrokenStore {
        async fn put(&self, _key: &str, _data: Bytes) -> Result<(), StoreError> {
            Err(StoreError::Internal("disk full".into()))
        }
        async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
            Err(StoreError::NotFound(key.to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_project_with_image_assigns_a_key() {
        let (svc, store, _tmp) = service();
        let project = svc
            .create_project(&project_input("Apollo"), Some(&png("logo.png")))
            .await
            .unwrap();
        let key = project.image_path.unwrap();
        assert!(key.starts_with("projects/"));
        assert!(store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn storage_write_failure_aborts_creation_entirely() {
        let db = Db::open_in_memory().unwrap();
        let svc = LocalService::new(db.clone(), Arc::new(BrokenStore));

        let err = svc
            .create_project(&project_input("Doomed"), Some(&png("logo.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));

        // No partial record pointing at an unwritten blob.
        let spec = QuerySpec::default_for(&taskboard_core::project::PROJECT_LIST);
        assert!(db.list_projects(&spec).unwrap().rows.is_empty());
    }

    #[tokio::test]
    async fn replacing_an_image_deletes_the_old_blob_after_the_swap() {
        let (svc, store, _tmp) = service();
        let project = svc
            .create_project(&project_input("Apollo"), Some(&png("old.png")))
            .await
            .unwrap();
        let old_key = project.image_path.clone().unwrap();

        let updated = svc
            .update_project(
                &project.id,
                &UpdateProject::default(),
                ImageChange::Upload(&png("new.png")),
            )
            .await
            .unwrap();
        let new_key = updated.image_path.unwrap();

        assert_ne!(new_key, old_key);
        assert!(store.exists(&new_key).await.unwrap());
        assert!(!store.exists(&old_key).await.unwrap());
    }

    #[tokio::test]
    async fn explicit_removal_clears_the_record_and_the_blob() {
        let (svc, store, _tmp) = service();
        let project = svc
            .create_project(&project_input("Apollo"), Some(&png("logo.png")))
            .await
            .unwrap();
        let key = project.image_path.clone().unwrap();

        let updated = svc
            .update_project(&project.id, &UpdateProject::default(), ImageChange::Remove)
            .await
            .unwrap();
        assert!(updated.image_path.is_none());
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn omitting_the_file_keeps_the_existing_attachment() {
        let (svc, _store, _tmp) = service();
        let project = svc
            .create_project(&project_input("Apollo"), Some(&png("logo.png")))
            .await
            .unwrap();

        let updated = svc
            .update_project(
                &project.id,
                &UpdateProject {
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
                ImageChange::Keep,
            )
            .await
            .unwrap();
        assert_eq!(updated.image_path, project.image_path);
        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn deleting_a_project_removes_owned_task_blobs() {
        let (svc, store, _tmp) = service();
        let project = svc
            .create_project(&project_input("Apollo"), Some(&png("p.png")))
            .await
            .unwrap();
        let task = svc
            .create_task(
                &CreateTask {
                    project_id: project.id.clone(),
                    title: "T".into(),
                    description: String::new(),
                    status: Status::Pending,
                    due_date: None,
                    assigned_to: None,
                },
                Some(&png("t.png")),
            )
            .await
            .unwrap();
        let project_key = project.image_path.clone().unwrap();
        let task_key = task.image_path.clone().unwrap();

        svc.delete_project(&project.id).await.unwrap();

        assert!(matches!(
            svc.get_task(&task.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(!store.exists(&project_key).await.unwrap());
        assert!(!store.exists(&task_key).await.unwrap());
    }

    #[tokio::test]
    async fn blank_name_is_a_field_error() {
        let (svc, _store, _tmp) = service();
        let err = svc
            .create_project(&project_input("   "), None)
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                assert_eq!(errors.fields.get("name").unwrap(), "is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_field_error() {
        let (svc, _store, _tmp) = service();
        svc.create_user(&CreateUser {
            name: "First".into(),
            email: "dup@example.com".into(),
        })
        .await
        .unwrap();

        let err = svc
            .create_user(&CreateUser {
                name: "Second".into(),
                email: "dup@example.com".into(),
            })
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                assert_eq!(errors.fields.get("email").unwrap(), "is already taken");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn updating_a_user_may_keep_their_own_email() {
        let (svc, _store, _tmp) = service();
        let user = svc
            .create_user(&CreateUser {
                name: "Sam".into(),
                email: "sam@example.com".into(),
            })
            .await
            .unwrap();

        let updated = svc
            .update_user(
                &user.id,
                &UpdateUser {
                    name: Some("Samantha".into()),
                    email: Some("sam@example.com".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Samantha");
    }

    #[tokio::test]
    async fn task_view_resolves_assignee_name_and_survives_user_deletion() {
        let (svc, _store, _tmp) = service();
        let project = svc.create_project(&project_input("P"), None).await.unwrap();
        let user = svc
            .create_user(&CreateUser {
                name: "Riley".into(),
                email: "riley@example.com".into(),
            })
            .await
            .unwrap();
        let task = svc
            .create_task(
                &CreateTask {
                    project_id: project.id.clone(),
                    title: "Assigned".into(),
                    description: String::new(),
                    status: Status::Pending,
                    due_date: None,
                    assigned_to: Some(user.id.clone()),
                },
                None,
            )
            .await
            .unwrap();

        let view = svc.get_task(&task.id).await.unwrap();
        assert_eq!(view.assigned_user_name.as_deref(), Some("Riley"));

        svc.delete_user(&user.id).await.unwrap();
        let view = svc.get_task(&task.id).await.unwrap();
        assert_eq!(view.assigned_user_name, None);
    }

    #[tokio::test]
    async fn creating_a_task_against_an_unknown_project_is_rejected() {
        let (svc, _store, _tmp) = service();
        let err = svc
            .create_task(
                &CreateTask {
                    project_id: "ghost".into(),
                    title: "T".into(),
                    description: String::new(),
                    status: Status::Pending,
                    due_date: None,
                    assigned_to: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_missing_entities_reports_not_found() {
        let (svc, _store, _tmp) = service();
        assert!(matches!(
            svc.delete_project("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_task("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_user("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
