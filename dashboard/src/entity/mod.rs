pub mod attendance;
pub mod college;
pub mod notification;
pub mod professor;
pub mod result;
pub mod student;
pub mod subject;
pub mod user;
