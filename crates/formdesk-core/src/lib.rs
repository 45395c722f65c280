//! Formdesk core
//!
//! Multi-tenant form builder: clients design forms out of typed fields,
//! publish them and collect submissions; super-admins see every tenant.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         SERVICES                             │
//! │  Auth │ Users │ Forms │ Submissions │ Analytics (+ CSV)      │
//! └───────────────────────────┬──────────────────────────────────┘
//!                             │  Actor (role + permissions)
//! ┌───────────────────────────▼──────────────────────────────────┐
//! │                    Repository (trait)                        │
//! │        MemoryRepository        │      SqliteRepository        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every service call that touches tenant data takes an [`Actor`]; the
//! ownership rule (owner or super-admin) is checked before any mutation.

#![warn(missing_docs)]

pub mod auth;
pub mod domain;
pub mod error;
pub mod export;
pub mod service;
pub mod store;

pub use auth::{Actor, Permission};
pub use domain::*;
pub use error::{FormdeskError, Result};
pub use service::{
    AnalyticsService, AuthService, AuthSession, Formdesk, FormsService, StorageStatus,
    SubmissionsService, UsersService,
};
pub use store::{MemoryRepository, Repository, SqliteRepository, SubmissionFilter};
