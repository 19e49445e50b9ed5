//! Session state machine and the state published to the UI layer.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │     Loading     │ (initial, until bootstrap resolves)
//! └────────┬────────┘
//!          │ Restored / NoSession
//!          ▼
//! ┌─────────────────┐  LoginAttempt   ┌─────────────────┐
//! │ Unauthenticated │ ──────────────► │    LoggingIn    │
//! └─────────────────┘ ◄────────────── └────────┬────────┘
//!          ▲             LoginFailed           │ LoginSuccess
//!          │                                   ▼
//!          │ LogoutComplete           ┌─────────────────┐
//! ┌────────┴────────┐ LogoutRequested │  Authenticated  │
//! │   LoggingOut    │ ◄────────────── └────────┬────────┘
//! └─────────────────┘                          │ SessionExpired
//!                                              ▼
//!                                       Unauthenticated
//! ```

use deskhub_api::UserProfile;
use rust_fsm::*;
use serde::Serialize;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Loading)

    Loading => {
        Restored => Authenticated,
        NoSession => Unauthenticated
    },
    Unauthenticated => {
        LoginAttempt => LoggingIn
    },
    LoggingIn => {
        LoginSuccess => Authenticated,
        LoginFailed => Unauthenticated
    },
    Authenticated => {
        LogoutRequested => LoggingOut,
        SessionExpired => Unauthenticated
    },
    LoggingOut => {
        LogoutComplete => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Settled authentication state, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum AuthState {
    /// Startup check still running.
    Loading,
    Authenticated(UserProfile),
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Snapshot of the session: `{ authenticated, user }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub authenticated: bool,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn authenticated(user: UserProfile) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }
}

impl From<&AuthState> for Session {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Authenticated(user) => Session::authenticated(user.clone()),
            AuthState::Loading | AuthState::Unauthenticated => Session::unauthenticated(),
        }
    }
}

impl From<&Session> for AuthState {
    fn from(session: &Session) -> Self {
        match &session.user {
            Some(user) if session.authenticated => AuthState::Authenticated(user.clone()),
            _ => AuthState::Unauthenticated,
        }
    }
}
