//! Jobseek client session library (session store, auth operations, collaborators).

pub mod config;
pub mod error;
pub mod notify;
pub mod operations;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;
pub mod upload;

pub use error::{FALLBACK_MESSAGE, OperationError, RequestError, RequestErrorKind};
pub use notify::{Notice, Notifier};
pub use operations::{EditProfileRequest, SessionClient, SessionOps};
pub use session::{ActiveSession, Credentials, ProfileFields, Session, User};
pub use store::{Operation, OperationResult, SessionStore, UserDescription};
