//! Domain model: users, forms, fields and submissions

pub mod form;
pub mod submission;
pub mod user;

pub use form::*;
pub use submission::*;
pub use user::*;
