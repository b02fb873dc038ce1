//! Name Request wizard state
//!
//! The application state behind the Name Request wizard: a single
//! [`state::RequestState`] record owned by a [`session::Session`], the
//! [`services::Workflow`] that feeds registry responses into it, a
//! [`store::DraftStore`] for saved drafts and the [`server`] that hosts the
//! built front-end.

pub mod config;
pub mod error;
pub mod server;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

pub use error::{ErrorKind, RequestError, SessionError, SessionResult};
pub use session::Session;
pub use state::RequestState;
