pub mod list;
pub mod projects;
pub mod tasks;
pub mod users;
