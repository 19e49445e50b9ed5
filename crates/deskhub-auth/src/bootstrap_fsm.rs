//! Startup state machine.
//!
//! ```text
//! Initializing ──CredentialFound──► Verifying ──Verified/Rejected──► Resolved
//!      │                                │
//!      └──NoCredential─────────────────►│
//!      └──DeadlineElapsed / Faulted ────┴──────────────────────────► Resolved
//! ```
//!
//! Phases only move forward. `Resolved` has no outgoing transitions.

use rust_fsm::*;
use serde::Serialize;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub bootstrap_machine(Initializing)

    Initializing => {
        CredentialFound => Verifying,
        NoCredential => Resolved,
        DeadlineElapsed => Resolved,
        Faulted => Resolved
    },
    Verifying => {
        Verified => Resolved,
        Rejected => Resolved,
        DeadlineElapsed => Resolved,
        Faulted => Resolved
    }
}

pub use bootstrap_machine::Input as BootstrapMachineInput;
pub use bootstrap_machine::State as BootstrapMachineState;
pub use bootstrap_machine::StateMachine as BootstrapMachine;

/// Observable bootstrap phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapPhase {
    Initializing,
    Verifying,
    Resolved,
}

impl BootstrapPhase {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BootstrapPhase::Resolved)
    }
}

impl From<&BootstrapMachineState> for BootstrapPhase {
    fn from(state: &BootstrapMachineState) -> Self {
        match state {
            BootstrapMachineState::Initializing => BootstrapPhase::Initializing,
            BootstrapMachineState::Verifying => BootstrapPhase::Verifying,
            BootstrapMachineState::Resolved => BootstrapPhase::Resolved,
        }
    }
}
