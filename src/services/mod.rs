//! Business logic services.
//!
//! The assignment engine works against the repository contracts in [`store`];
//! team and user management query the pool directly.

pub mod assignment;
pub mod deadline;
pub mod store;
pub mod teams;
pub mod users;

pub use assignment::AssignmentEngine;
pub use store::{ReviewStore, SqliteStore};
pub use teams::TeamService;
pub use users::UserService;
