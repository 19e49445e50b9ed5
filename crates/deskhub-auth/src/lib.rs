//! Session lifecycle for the support desk client.
//!
//! [`Bootstrap`] decides at startup whether a stored credential is still
//! good, bounded by a hard deadline. [`SessionController`] owns the session
//! afterwards: login, logout, and the reaction to a revoked credential.

mod backend;
mod bootstrap;
mod bootstrap_fsm;
mod controller;
mod error;
mod session_fsm;

#[cfg(test)]
mod test_support;

pub use backend::AuthBackend;
pub use bootstrap::{Bootstrap, BootstrapConfig, BootstrapReport, Resolution};
pub use bootstrap_fsm::{
    bootstrap_machine, BootstrapMachine, BootstrapMachineInput, BootstrapMachineState,
    BootstrapPhase,
};
pub use controller::{SessionController, SessionSettings};
pub use error::{AuthError, AuthResult, Notice};
pub use session_fsm::{
    session_machine, AuthState, Session, SessionMachine, SessionMachineInput,
    SessionMachineState,
};
