//! Startup authentication check.
//!
//! [`Bootstrap::run`] reads the stored credential, verifies it with the server
//! and always resolves within the global deadline. The resolution steps race
//! a deadline sleep; whichever finishes first drops the other, so neither an
//! in-flight verification nor the timer outlives the run.

use crate::bootstrap_fsm::{BootstrapMachine, BootstrapMachineInput, BootstrapPhase};
use crate::{AuthBackend, Session};
use deskhub_config::TimeoutConfig;
use deskhub_storage::CredentialStore;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Deadlines for the startup check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Hard upper bound on the whole run.
    pub global_deadline: Duration,
    /// Bound on server verification. Should leave headroom below
    /// `global_deadline` for clearing the credential afterwards.
    pub verify_deadline: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::from_timeouts(&TimeoutConfig::default())
    }
}

impl BootstrapConfig {
    pub fn from_timeouts(timeouts: &TimeoutConfig) -> Self {
        Self {
            global_deadline: timeouts.bootstrap_deadline(),
            verify_deadline: timeouts.verify_deadline(),
        }
    }
}

/// How the run reached `Resolved`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Resolution {
    /// Nothing stored; no network call was made.
    NoCredential,
    /// The server confirmed the credential.
    Verified,
    /// The server refused the credential or sent an unusable payload.
    Rejected(String),
    /// Verification exceeded its own deadline.
    VerifyTimedOut,
    /// The global deadline fired first.
    DeadlineElapsed,
    /// A step panicked.
    Faulted,
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub session: Session,
    pub resolution: Resolution,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// One startup check. Consumed by [`run`](Self::run).
pub struct Bootstrap {
    backend: Arc<dyn AuthBackend>,
    credentials: CredentialStore,
    config: BootstrapConfig,
    fsm: Mutex<BootstrapMachine>,
    phase_tx: watch::Sender<BootstrapPhase>,
}

impl Bootstrap {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        credentials: CredentialStore,
        config: BootstrapConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(BootstrapPhase::Initializing);
        Self {
            backend,
            credentials,
            config,
            fsm: Mutex::new(BootstrapMachine::new()),
            phase_tx,
        }
    }

    /// Subscribe to phase changes.
    pub fn phases(&self) -> watch::Receiver<BootstrapPhase> {
        self.phase_tx.subscribe()
    }

    pub fn phase(&self) -> BootstrapPhase {
        *self.phase_tx.borrow()
    }

    /// Run to `Resolved`. Never fails and never exceeds the global deadline
    /// by more than scheduling slack.
    pub async fn run(self) -> BootstrapReport {
        let started = Instant::now();
        debug!(
            global_deadline_ms = self.config.global_deadline.as_millis() as u64,
            verify_deadline_ms = self.config.verify_deadline.as_millis() as u64,
            "Bootstrap started"
        );

        let steps = AssertUnwindSafe(self.resolve()).catch_unwind();
        let deadline = tokio::time::sleep(self.config.global_deadline);

        let (session, resolution) = tokio::select! {
            biased;

            outcome = steps => match outcome {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("Bootstrap step panicked, resolving unauthenticated");
                    self.advance(BootstrapMachineInput::Faulted);
                    (Session::unauthenticated(), Resolution::Faulted)
                }
            },
            _ = deadline => {
                // Storage may be what is stuck; leave the credential for the next start.
                warn!(phase = ?self.phase(), "Bootstrap deadline elapsed, resolving unauthenticated");
                self.advance(BootstrapMachineInput::DeadlineElapsed);
                (Session::unauthenticated(), Resolution::DeadlineElapsed)
            }
        };

        let elapsed = started.elapsed();
        info!(
            authenticated = session.authenticated,
            resolution = ?resolution,
            elapsed_ms = elapsed.as_millis() as u64,
            "Bootstrap resolved"
        );

        BootstrapReport {
            session,
            resolution,
            elapsed,
        }
    }

    async fn resolve(&self) -> (Session, Resolution) {
        if self.credentials.get().await.is_none() {
            self.advance(BootstrapMachineInput::NoCredential);
            return (Session::unauthenticated(), Resolution::NoCredential);
        }

        self.advance(BootstrapMachineInput::CredentialFound);

        let outcome = tokio::time::timeout(self.config.verify_deadline, self.backend.verify()).await;
        match outcome {
            Ok(Ok(user)) => {
                self.advance(BootstrapMachineInput::Verified);
                debug!(user_id = %user.id, "Stored credential verified");
                (Session::authenticated(user), Resolution::Verified)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Stored credential rejected");
                self.credentials.clear().await;
                self.advance(BootstrapMachineInput::Rejected);
                (Session::unauthenticated(), Resolution::Rejected(e.to_string()))
            }
            Err(_) => {
                warn!(
                    verify_deadline_ms = self.config.verify_deadline.as_millis() as u64,
                    "Verification timed out"
                );
                self.credentials.clear().await;
                self.advance(BootstrapMachineInput::Rejected);
                (Session::unauthenticated(), Resolution::VerifyTimedOut)
            }
        }
    }

    fn advance(&self, input: BootstrapMachineInput) {
        let mut fsm = self.fsm.lock();
        if fsm.consume(&input).is_err() {
            error!(input = ?input, state = ?fsm.state(), "Invalid bootstrap transition");
            return;
        }
        let phase = BootstrapPhase::from(fsm.state());
        drop(fsm);

        debug!(phase = ?phase, "Bootstrap phase");
        self.phase_tx.send_replace(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use deskhub_api::ApiError;
    use deskhub_storage::{SecureStorage, StorageKeys};

    const SLACK: Duration = Duration::from_millis(50);

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            global_deadline: Duration::from_secs(10),
            verify_deadline: Duration::from_secs(8),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_verified_credential_resolves_authenticated() {
        let (_, store) = memory_store(Some("T1")).await;
        let backend = Arc::new(
            FakeBackend::new()
                .with_verify(Script::Delayed(Duration::from_secs(1), user(1, "a@x.com"))),
        );

        let bootstrap = Bootstrap::new(backend.clone(), store.clone(), config());
        let phases = bootstrap.phases();
        let report = bootstrap.run().await;

        assert_eq!(report.resolution, Resolution::Verified);
        assert!(report.session.authenticated);
        assert_eq!(
            report.session.user.unwrap().id,
            deskhub_api::Id::Number(1)
        );
        assert!(report.elapsed >= Duration::from_secs(1));
        assert!(report.elapsed < Duration::from_secs(1) + SLACK);
        assert_eq!(*phases.borrow(), BootstrapPhase::Resolved);
        assert!(store.get().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_credential_skips_network() {
        let (_, store) = memory_store(None).await;
        let backend = Arc::new(FakeBackend::new());

        let report = Bootstrap::new(backend.clone(), store, config()).run().await;

        assert_eq!(report.resolution, Resolution::NoCredential);
        assert_eq!(report.session, Session::unauthenticated());
        assert_eq!(FakeBackend::calls(&backend.verify_calls), 0);
        assert!(report.elapsed < SLACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_verify_times_out_and_clears() {
        let (storage, store) = memory_store(Some("T1")).await;
        let backend = Arc::new(FakeBackend::new().with_verify(Script::Hang));

        let report = Bootstrap::new(backend, store, config()).run().await;

        assert_eq!(report.resolution, Resolution::VerifyTimedOut);
        assert!(!report.session.authenticated);
        assert!(report.elapsed >= Duration::from_secs(8));
        assert!(report.elapsed < Duration::from_secs(8) + SLACK);
        assert!(!storage.has(StorageKeys::AUTH_TOKEN).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_and_malformed_verify_clear_credential() {
        for failure in [
            ApiError::Unauthorized,
            ApiError::MalformedPayload("missing field `user`".into()),
            ApiError::Network("connection reset".into()),
        ] {
            let (storage, store) = memory_store(Some("T1")).await;
            let backend = Arc::new(FakeBackend::new().with_verify(Script::Fail(failure)));

            let report = Bootstrap::new(backend, store, config()).run().await;

            assert!(matches!(report.resolution, Resolution::Rejected(_)));
            assert!(!report.session.authenticated);
            assert!(!storage.has(StorageKeys::AUTH_TOKEN).await.unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_verify_is_faulted() {
        let (_, store) = memory_store(Some("T1")).await;
        let backend = Arc::new(FakeBackend::new().with_verify(Script::Panic));

        let bootstrap = Bootstrap::new(backend, store, config());
        let phases = bootstrap.phases();
        let report = bootstrap.run().await;

        assert_eq!(report.resolution, Resolution::Faulted);
        assert!(!report.session.authenticated);
        assert_eq!(*phases.borrow(), BootstrapPhase::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_storage_hits_global_deadline() {
        // Storage bound longer than the whole bootstrap.
        let store = CredentialStore::new(Arc::new(HangingStorage), Duration::from_secs(60));
        let backend = Arc::new(FakeBackend::new());

        let report = Bootstrap::new(backend.clone(), store, config()).run().await;

        assert_eq!(report.resolution, Resolution::DeadlineElapsed);
        assert!(!report.session.authenticated);
        assert!(report.elapsed >= Duration::from_secs(10));
        assert!(report.elapsed < Duration::from_secs(10) + SLACK);
        assert_eq!(FakeBackend::calls(&backend.verify_calls), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_discards_inflight_verification() {
        let (storage, store) = memory_store(Some("T1")).await;
        let backend = Arc::new(
            FakeBackend::new()
                .with_verify(Script::Delayed(Duration::from_secs(30), user(1, "a@x.com"))),
        );
        // Misconfigured: verification allowed to outlast the global deadline.
        let config = BootstrapConfig {
            global_deadline: Duration::from_secs(10),
            verify_deadline: Duration::from_secs(20),
        };

        let report = Bootstrap::new(backend, store, config).run().await;

        assert_eq!(report.resolution, Resolution::DeadlineElapsed);
        assert!(!report.session.authenticated);
        assert!(report.elapsed < Duration::from_secs(10) + SLACK);
        // The credential stays for the next start to re-check.
        assert!(storage.has(StorageKeys::AUTH_TOKEN).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_storage_resolves_unauthenticated() {
        let store = CredentialStore::new(Arc::new(FailingStorage), STORAGE_TIMEOUT);
        let backend = Arc::new(FakeBackend::new());

        let report = Bootstrap::new(backend, store, config()).run().await;

        assert_eq!(report.resolution, Resolution::NoCredential);
        assert!(!report.session.authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phases_move_forward() {
        let (_, store) = memory_store(Some("T1")).await;
        let backend = Arc::new(FakeBackend::new().with_verify(Script::Hang));

        let bootstrap = Bootstrap::new(backend, store, config());
        let mut phases = bootstrap.phases();
        assert_eq!(*phases.borrow_and_update(), BootstrapPhase::Initializing);

        let handle = tokio::spawn(bootstrap.run());

        phases.changed().await.unwrap();
        assert_eq!(*phases.borrow_and_update(), BootstrapPhase::Verifying);

        phases.changed().await.unwrap();
        assert_eq!(*phases.borrow_and_update(), BootstrapPhase::Resolved);

        let report = handle.await.unwrap();
        assert_eq!(report.resolution, Resolution::VerifyTimedOut);
    }

    /// Every combination of storage and network behavior resolves in time.
    #[tokio::test(start_paused = true)]
    async fn test_always_resolves_within_global_deadline() {
        let storages: Vec<(&str, Box<dyn Fn() -> CredentialStore>)> = vec![
            (
                "hang",
                Box::new(|| CredentialStore::new(Arc::new(HangingStorage), Duration::from_secs(60))),
            ),
            (
                "fault",
                Box::new(|| CredentialStore::new(Arc::new(FailingStorage), STORAGE_TIMEOUT)),
            ),
            (
                "slow-hang",
                Box::new(|| CredentialStore::new(Arc::new(HangingStorage), STORAGE_TIMEOUT)),
            ),
        ];

        let networks: Vec<(&str, Script<deskhub_api::UserProfile>)> = vec![
            ("hang", Script::Hang),
            ("fault", Script::Fail(ApiError::Network("unreachable".into()))),
            ("malformed", Script::Fail(ApiError::MalformedPayload("no user".into()))),
            ("success", Script::Respond(user(1, "a@x.com"))),
            ("panic", Script::Panic),
        ];

        for (storage_name, make_store) in &storages {
            for (network_name, script) in &networks {
                let backend = Arc::new(FakeBackend::new().with_verify(script.clone()));
                let report = Bootstrap::new(backend, make_store(), config()).run().await;
                assert!(
                    report.elapsed <= config().global_deadline + SLACK,
                    "storage={} network={} took {:?}",
                    storage_name,
                    network_name,
                    report.elapsed
                );
            }
        }

        // Successful storage, every network behavior.
        for (network_name, script) in &networks {
            let (_, store) = memory_store(Some("T1")).await;
            let backend = Arc::new(FakeBackend::new().with_verify(script.clone()));
            let report = Bootstrap::new(backend, store, config()).run().await;
            assert!(
                report.elapsed <= config().global_deadline + SLACK,
                "storage=ok network={} took {:?}",
                network_name,
                report.elapsed
            );
            assert_eq!(
                report.session.authenticated,
                *network_name == "success",
                "network={}",
                network_name
            );
        }
    }
}
