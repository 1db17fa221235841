//! Session store (reducer).
//!
//! The store holds exactly one `Session`. Its only transition is
//! [`SessionStore::apply`]: every successful operation result replaces the
//! whole session. Loading and failure never reach the store.
//!
//! The store is backed by a `tokio::sync::watch` channel so observers can
//! follow replacements, and so operations that finish concurrently settle
//! last-write-wins without extra locking.

use tokio::sync::watch;

use crate::session::{Session, User};

/// The four session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    RefreshToken,
    Logout,
    EditProfile,
}

impl Operation {
    /// Identifying name of the operation (`auth/<name>`).
    pub fn type_name(self) -> &'static str {
        match self {
            Operation::Login => "auth/login",
            Operation::RefreshToken => "auth/refreshToken",
            Operation::Logout => "auth/logout",
            Operation::EditProfile => "auth/editProfile",
        }
    }

    /// Completion signal name (`auth/<name>/fulfilled`).
    pub fn fulfilled_type(self) -> String {
        format!("{}/fulfilled", self.type_name())
    }
}

/// Successful outcome of a session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Login(Session),
    RefreshToken(Session),
    Logout,
    EditProfile(Session),
}

impl OperationResult {
    pub fn operation(&self) -> Operation {
        match self {
            OperationResult::Login(_) => Operation::Login,
            OperationResult::RefreshToken(_) => Operation::RefreshToken,
            OperationResult::Logout => Operation::Logout,
            OperationResult::EditProfile(_) => Operation::EditProfile,
        }
    }

    pub fn session(&self) -> &Session {
        static EMPTY: Session = Session::Empty;
        match self {
            OperationResult::Login(session)
            | OperationResult::RefreshToken(session)
            | OperationResult::EditProfile(session) => session,
            OperationResult::Logout => &EMPTY,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            OperationResult::Login(session)
            | OperationResult::RefreshToken(session)
            | OperationResult::EditProfile(session) => session,
            OperationResult::Logout => Session::Empty,
        }
    }
}

/// Holder of the single current session.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::Empty);
        Self { tx }
    }

    /// Replaces the whole session with the operation's payload.
    pub fn apply(&self, result: OperationResult) {
        let operation = result.operation();
        let session = result.into_session();
        tracing::debug!(
            action = %operation.fulfilled_type(),
            authenticated = !session.is_empty(),
            "session replaced"
        );
        self.tx.send_replace(session);
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().access_token().map(str::to_string)
    }

    pub fn user(&self) -> Option<User> {
        self.tx.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.tx.borrow().is_empty()
    }

    /// Receiver that observes every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

/// User opened for detailed viewing (e.g. a profile description panel).
///
/// Same shape as the session store: one transition that replaces the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDescription {
    current: Option<User>,
}

impl UserDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the opened user; `None` closes the view.
    pub fn open(&mut self, payload: Option<User>) {
        self.current = payload;
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}
