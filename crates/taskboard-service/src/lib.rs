mod attachments;
mod local;
mod traits;

pub use attachments::{AttachmentManager, ImageChange, UploadedFile};
pub use local::LocalService;
pub use traits::{AdminService, ServiceError};
