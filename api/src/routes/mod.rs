//! API Routes

pub mod analytics;
pub mod auth;
pub mod forms;
pub mod health;
pub mod submissions;
pub mod users;
