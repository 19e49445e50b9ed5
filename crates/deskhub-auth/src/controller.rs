//! Session controller: owns the session, runs login/logout, publishes state.
//!
//! State is published through a `watch` channel. Only settled states
//! (`Loading`, `Authenticated`, `Unauthenticated`) reach subscribers; the
//! internal FSM tracks the in-flight ones. Login, logout and bootstrap are
//! serialized by one operation guard, so the last operation to finish is the
//! one whose state stays published.
//!
//! Operations are cancel-safe. If a login or logout future is dropped while
//! the FSM sits in `LoggingIn`/`LoggingOut`, the FSM returns to
//! `Unauthenticated` and the stored credential is cleared before the next
//! operation runs.

use crate::bootstrap::{Bootstrap, BootstrapConfig, BootstrapReport};
use crate::session_fsm::{
    AuthState, Session, SessionMachine, SessionMachineInput, SessionMachineState,
};
use crate::{AuthBackend, AuthError, AuthResult};
use deskhub_api::LoginRequest;
use deskhub_config::Config;
use deskhub_storage::{Credential, CredentialStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, MutexGuard};
use tracing::{debug, info, warn};

/// Settings for [`SessionController`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub bootstrap: BootstrapConfig,
    /// Bound on the best-effort server call during logout.
    pub logout_timeout: Duration,
    /// Sent as `device_name` on login.
    pub device_name: String,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bootstrap: BootstrapConfig::from_timeouts(&config.timeouts),
            logout_timeout: config.timeouts.logout_timeout(),
            device_name: config.device_name.clone(),
        }
    }
}

pub struct SessionController {
    backend: Arc<dyn AuthBackend>,
    credentials: CredentialStore,
    settings: SessionSettings,
    fsm: Mutex<SessionMachine>,
    state_tx: watch::Sender<AuthState>,
    op_guard: Arc<tokio::sync::Mutex<()>>,
    /// Set when an operation was dropped and its credential write may be
    /// incomplete.
    interrupted: Arc<AtomicBool>,
}

#[derive(Debug, Clone, Copy)]
enum LogoutScope {
    ThisDevice,
    AllDevices,
}

impl LogoutScope {
    fn label(self) -> &'static str {
        match self {
            LogoutScope::ThisDevice => "logout",
            LogoutScope::AllDevices => "logout-all",
        }
    }
}

/// Undoes a transient FSM state when the operation holding it is dropped.
struct Rollback<'a> {
    controller: &'a SessionController,
    input: SessionMachineInput,
    publish: Option<AuthState>,
    armed: bool,
}

impl<'a> Rollback<'a> {
    fn new(controller: &'a SessionController, input: SessionMachineInput) -> Self {
        Self {
            controller,
            input,
            publish: None,
            armed: true,
        }
    }

    fn publishing(mut self, state: AuthState) -> Self {
        self.publish = Some(state);
        self
    }

    /// The operation reached a settled state on its own.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let controller = self.controller;
        warn!(input = ?self.input, "Session operation cancelled, rolling back");
        if controller.transition(&self.input).is_ok() {
            if let Some(state) = self.publish.take() {
                controller.publish(state);
            }
        }

        controller.interrupted.store(true, Ordering::SeqCst);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let op_guard = controller.op_guard.clone();
            let interrupted = controller.interrupted.clone();
            let credentials = controller.credentials.clone();
            handle.spawn(async move {
                let _guard = op_guard.lock().await;
                clear_if_interrupted(&interrupted, &credentials).await;
            });
        }
    }
}

async fn clear_if_interrupted(interrupted: &AtomicBool, credentials: &CredentialStore) {
    if interrupted.load(Ordering::SeqCst) {
        debug!("Clearing credential left by a cancelled operation");
        credentials.clear().await;
        interrupted.store(false, Ordering::SeqCst);
    }
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        credentials: CredentialStore,
        settings: SessionSettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Loading);
        Self {
            backend,
            credentials,
            settings,
            fsm: Mutex::new(SessionMachine::new()),
            state_tx,
            op_guard: Arc::new(tokio::sync::Mutex::new(())),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receive every published state, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Last published state.
    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Last published state as `{ authenticated, user }`.
    pub fn current_session(&self) -> Session {
        Session::from(&*self.state_tx.borrow())
    }

    pub fn fsm_state(&self) -> SessionMachineState {
        self.fsm.lock().state().clone()
    }

    /// A bootstrap wired to this controller's backend and store. Pass it to
    /// [`bootstrap_with`](Self::bootstrap_with) after subscribing to its phases.
    pub fn new_bootstrap(&self) -> Bootstrap {
        Bootstrap::new(
            self.backend.clone(),
            self.credentials.clone(),
            self.settings.bootstrap,
        )
    }

    /// Run the startup check and leave `Loading`.
    pub async fn bootstrap(&self) -> AuthResult<BootstrapReport> {
        self.bootstrap_with(self.new_bootstrap()).await
    }

    pub async fn bootstrap_with(&self, bootstrap: Bootstrap) -> AuthResult<BootstrapReport> {
        let _guard = self.begin().await;
        if self.fsm_state() != SessionMachineState::Loading {
            return Err(AuthError::InvalidStateTransition(
                "bootstrap already completed".to_string(),
            ));
        }

        let report = bootstrap.run().await;
        let state = AuthState::from(&report.session);
        let input = if state.is_authenticated() {
            SessionMachineInput::Restored
        } else {
            SessionMachineInput::NoSession
        };
        self.transition(&input)?;
        self.publish(state);

        Ok(report)
    }

    /// Log in with email and password.
    ///
    /// On failure the published state is left as it was. A session whose
    /// credential cannot be stored is refused with
    /// [`AuthError::CredentialNotSaved`].
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        let _guard = self.begin().await;

        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        self.transition(&SessionMachineInput::LoginAttempt)?;
        let rollback = Rollback::new(self, SessionMachineInput::LoginFailed);

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            device_name: self.settings.device_name.clone(),
        };

        match self.backend.login(&request).await {
            Ok(response) => {
                let credential = Credential::new(response.token);
                if !self.credentials.set(&credential).await {
                    self.credentials.clear().await;
                    rollback.disarm();
                    self.transition(&SessionMachineInput::LoginFailed)?;
                    warn!("Login failed, credential could not be saved");
                    return Err(AuthError::CredentialNotSaved);
                }
                rollback.disarm();
                self.transition(&SessionMachineInput::LoginSuccess)?;
                info!(user_id = %response.user.id, "Logged in");

                let session = Session::authenticated(response.user.clone());
                self.publish(AuthState::Authenticated(response.user));
                Ok(session)
            }
            Err(e) => {
                rollback.disarm();
                self.transition(&SessionMachineInput::LoginFailed)?;
                let err = AuthError::from_login_failure(e);
                warn!(error = %err, "Login failed");
                Err(err)
            }
        }
    }

    /// End this device's session. Local state is cleared even if the server
    /// cannot be reached.
    pub async fn logout(&self) -> AuthResult<()> {
        self.end_session(LogoutScope::ThisDevice).await
    }

    /// End every session of this user on the server, then locally.
    pub async fn logout_all_devices(&self) -> AuthResult<()> {
        self.end_session(LogoutScope::AllDevices).await
    }

    /// A request failed with `Unauthorized` after the pipeline's refresh
    /// attempt. Ends the session locally.
    pub async fn handle_unauthorized(&self) {
        let _guard = self.begin().await;
        self.credentials.clear().await;

        if self.fsm_state() == SessionMachineState::Authenticated
            && self
                .transition(&SessionMachineInput::SessionExpired)
                .is_ok()
        {
            info!("Session expired");
            self.publish(AuthState::Unauthenticated);
        }
    }

    /// The credential leaves the store before the server is told, so a
    /// dropped or hung server call cannot leave it behind.
    async fn end_session(&self, scope: LogoutScope) -> AuthResult<()> {
        let _guard = self.begin().await;
        let label = scope.label();

        match self.fsm_state() {
            SessionMachineState::Authenticated => {}
            SessionMachineState::Unauthenticated | SessionMachineState::Loading => {
                debug!(operation = label, "No active session, clearing local credential only");
                self.credentials.clear().await;
                return Ok(());
            }
            other => {
                return Err(AuthError::InvalidStateTransition(format!(
                    "{} while {:?}",
                    label, other
                )));
            }
        }

        self.transition(&SessionMachineInput::LogoutRequested)?;
        let rollback = Rollback::new(self, SessionMachineInput::LogoutComplete)
            .publishing(AuthState::Unauthenticated);

        let credential = self.credentials.get().await;
        self.credentials.clear().await;

        match credential {
            Some(credential) => {
                let notify = async {
                    match scope {
                        LogoutScope::ThisDevice => self.backend.logout(&credential).await,
                        LogoutScope::AllDevices => self.backend.logout_all(&credential).await,
                    }
                };
                match tokio::time::timeout(self.settings.logout_timeout, notify).await {
                    Ok(Ok(())) => debug!(operation = label, "Server acknowledged logout"),
                    Ok(Err(e)) => warn!(operation = label, error = %e, "Server logout failed, ending session locally"),
                    Err(_) => warn!(
                        operation = label,
                        timeout_ms = self.settings.logout_timeout.as_millis() as u64,
                        "Server logout timed out, ending session locally"
                    ),
                }
            }
            None => debug!(operation = label, "No stored credential, skipping server logout"),
        }

        rollback.disarm();
        self.transition(&SessionMachineInput::LogoutComplete)?;
        info!(operation = label, "Logged out");
        self.publish(AuthState::Unauthenticated);
        Ok(())
    }

    /// Serialize with other operations and finish any cleanup a cancelled
    /// one left behind.
    async fn begin(&self) -> MutexGuard<'_, ()> {
        let guard = self.op_guard.lock().await;
        clear_if_interrupted(&self.interrupted, &self.credentials).await;
        guard
    }

    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionMachineState> {
        let mut fsm = self.fsm.lock();
        let old_state = fsm.state().clone();

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = fsm.state().clone();
        debug!(old_state = ?old_state, new_state = ?new_state, "Session state transition");
        Ok(new_state)
    }

    fn publish(&self, state: AuthState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use deskhub_api::{ApiError, LoginResponse, Suspension};
    use deskhub_storage::{CredentialStore, MemoryStorage, SecureStorage, StorageKeys};

    fn settings() -> SessionSettings {
        SessionSettings {
            bootstrap: BootstrapConfig {
                global_deadline: Duration::from_secs(10),
                verify_deadline: Duration::from_secs(8),
            },
            logout_timeout: Duration::from_secs(5),
            device_name: "test-device".to_string(),
        }
    }

    fn login_ok(token: &str) -> Script<LoginResponse> {
        Script::Respond(LoginResponse {
            user: user(7, "agent@x.com"),
            token: token.to_string(),
        })
    }

    async fn controller(
        token: Option<&str>,
        backend: FakeBackend,
    ) -> (Arc<MemoryStorage>, Arc<FakeBackend>, SessionController) {
        let (storage, store) = memory_store(token).await;
        let backend = Arc::new(backend);
        let controller = SessionController::new(backend.clone(), store, settings());
        (storage, backend, controller)
    }

    /// Controller that has finished bootstrap unauthenticated.
    async fn logged_out(
        backend: FakeBackend,
    ) -> (Arc<MemoryStorage>, Arc<FakeBackend>, SessionController) {
        let (storage, backend, controller) = controller(None, backend).await;
        controller.bootstrap().await.unwrap();
        (storage, backend, controller)
    }

    async fn stored(storage: &MemoryStorage) -> Option<String> {
        storage.get(StorageKeys::AUTH_TOKEN).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_loading() {
        let (_, _, controller) = controller(None, FakeBackend::new()).await;
        assert_eq!(controller.state(), AuthState::Loading);
        assert_eq!(controller.current_session(), Session::unauthenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_publishes_authenticated() {
        let backend = FakeBackend::new().with_verify(Script::Respond(user(1, "a@x.com")));
        let (_, _, controller) = controller(Some("T1"), backend).await;
        let mut rx = controller.subscribe();

        let report = controller.bootstrap().await.unwrap();

        assert!(report.session.authenticated);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());
        assert_eq!(controller.fsm_state(), SessionMachineState::Authenticated);
        assert!(matches!(
            controller.bootstrap().await,
            Err(AuthError::InvalidStateTransition(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_stores_credential_and_publishes() {
        let (storage, _, controller) = logged_out(FakeBackend::new().with_login(login_ok("T1"))).await;
        let mut rx = controller.subscribe();
        rx.borrow_and_update();

        let session = controller.login("agent@x.com", "secret").await.unwrap();

        assert!(session.authenticated);
        assert_eq!(stored(&storage).await.as_deref(), Some("T1"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow().user().map(|u| u.email.as_str()),
            Some("agent@x.com")
        );
        assert_eq!(controller.current_session(), session);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_failures_map_to_categories() {
        let cases: [(ApiError, fn(&AuthError) -> bool); 5] = [
            (ApiError::Unauthorized, |e| matches!(e, AuthError::InvalidCredentials)),
            (
                ApiError::Forbidden {
                    message: None,
                    suspension: Some(Suspension {
                        reason: Some("Fraud review".into()),
                        suspended_until: None,
                    }),
                },
                |e| matches!(e, AuthError::AccountSuspended { .. }),
            ),
            (
                ApiError::Forbidden {
                    message: None,
                    suspension: None,
                },
                |e| matches!(e, AuthError::InsufficientPermissions),
            ),
            (ApiError::RateLimited { retry_after: None }, |e| {
                matches!(e, AuthError::RateLimited { .. })
            }),
            (ApiError::Timeout, |e| matches!(e, AuthError::Timeout)),
        ];

        for (failure, expected) in cases {
            let (storage, _, controller) =
                logged_out(FakeBackend::new().with_login(Script::Fail(failure.clone()))).await;

            let err = controller.login("agent@x.com", "secret").await.unwrap_err();
            assert!(expected(&err), "{:?} mapped to {:?}", failure, err);
            assert_eq!(controller.state(), AuthState::Unauthenticated);
            assert_eq!(controller.fsm_state(), SessionMachineState::Unauthenticated);
            assert_eq!(stored(&storage).await, None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_token_fails_login() {
        let backend = FakeBackend::new().with_login(Script::Fail(ApiError::MalformedPayload(
            "token is empty or not printable ASCII".into(),
        )));
        let (storage, _, controller) = logged_out(backend).await;

        let err = controller.login("agent@x.com", "secret").await.unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse(_)));
        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&storage).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_fails_when_credential_cannot_be_saved() {
        for storage in [
            Arc::new(FailingStorage) as Arc<dyn SecureStorage>,
            Arc::new(HangingStorage) as Arc<dyn SecureStorage>,
        ] {
            let store = CredentialStore::new(storage, STORAGE_TIMEOUT);
            let backend = Arc::new(FakeBackend::new().with_login(login_ok("T1")));
            let controller = SessionController::new(backend, store, settings());
            controller.bootstrap().await.unwrap();
            let mut rx = controller.subscribe();
            rx.borrow_and_update();

            let err = controller.login("agent@x.com", "secret").await.unwrap_err();

            assert!(matches!(err, AuthError::CredentialNotSaved));
            assert_eq!(err.notice().title, "Could not save session");
            assert_eq!(controller.fsm_state(), SessionMachineState::Unauthenticated);
            assert!(!rx.has_changed().unwrap());
            assert_eq!(controller.state(), AuthState::Unauthenticated);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_login_can_be_retried() {
        let (storage, backend, controller) =
            logged_out(FakeBackend::new().with_login(Script::Hang)).await;

        let attempt = tokio::time::timeout(
            Duration::from_secs(1),
            controller.login("agent@x.com", "secret"),
        )
        .await;
        assert!(attempt.is_err());
        assert_eq!(controller.fsm_state(), SessionMachineState::Unauthenticated);
        assert_eq!(controller.state(), AuthState::Unauthenticated);

        *backend.login.lock() = login_ok("T2");
        let session = controller.login("agent@x.com", "secret").await.unwrap();

        assert!(session.authenticated);
        assert!(controller.state().is_authenticated());
        tokio::task::yield_now().await;
        assert_eq!(stored(&storage).await.as_deref(), Some("T2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_logout_still_ends_session() {
        let backend = FakeBackend::new()
            .with_login(login_ok("T1"))
            .with_logout(Script::Hang);
        let (storage, backend, controller) = logged_out(backend).await;
        controller.login("agent@x.com", "pw").await.unwrap();

        let attempt = tokio::time::timeout(Duration::from_secs(1), controller.logout()).await;
        assert!(attempt.is_err());

        assert_eq!(controller.fsm_state(), SessionMachineState::Unauthenticated);
        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&storage).await, None);
        assert_eq!(*backend.revoked.lock(), vec!["T1".to_string()]);

        controller.logout().await.unwrap();
        assert_eq!(FakeBackend::calls(&backend.logout_calls), 1);

        controller.login("agent@x.com", "pw").await.unwrap();
        assert!(controller.state().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_rejected_while_loading_or_authenticated() {
        let (_, backend, controller) =
            controller(None, FakeBackend::new().with_login(login_ok("T1"))).await;

        assert!(matches!(
            controller.login("a@x.com", "pw").await,
            Err(AuthError::InvalidStateTransition(_))
        ));

        controller.bootstrap().await.unwrap();
        controller.login("a@x.com", "pw").await.unwrap();
        assert!(matches!(
            controller.login("a@x.com", "pw").await,
            Err(AuthError::InvalidStateTransition(_))
        ));
        assert_eq!(FakeBackend::calls(&backend.login_calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_credentials_rejected_locally() {
        let (_, backend, controller) = logged_out(FakeBackend::new()).await;

        assert!(matches!(
            controller.login("  ", "pw").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(FakeBackend::calls(&backend.login_calls), 0);
        assert_eq!(controller.fsm_state(), SessionMachineState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_logins_are_serialized() {
        let backend = FakeBackend::new().with_login(Script::Delayed(
            Duration::from_secs(1),
            LoginResponse {
                user: user(7, "agent@x.com"),
                token: "T1".into(),
            },
        ));
        let (_, backend, controller) = logged_out(backend).await;
        let controller = Arc::new(controller);

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.login("agent@x.com", "pw").await }
        });
        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.login("agent@x.com", "pw").await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(FakeBackend::calls(&backend.login_calls), 1);
        assert!(controller.state().is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_when_unauthenticated_is_noop() {
        let (storage, backend, controller) = logged_out(FakeBackend::new()).await;

        controller.logout().await.unwrap();
        controller.logout().await.unwrap();

        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(FakeBackend::calls(&backend.logout_calls), 0);
        assert_eq!(stored(&storage).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_even_when_server_fails() {
        for script in [
            Script::Fail(ApiError::Network("unreachable".into())),
            Script::Fail(ApiError::Unauthorized),
            Script::Hang,
        ] {
            let backend = FakeBackend::new()
                .with_login(login_ok("T1"))
                .with_logout(script);
            let (storage, backend, controller) = logged_out(backend).await;
            controller.login("agent@x.com", "pw").await.unwrap();

            let started = tokio::time::Instant::now();
            controller.logout().await.unwrap();

            assert!(started.elapsed() <= Duration::from_secs(5) + Duration::from_millis(50));
            assert_eq!(FakeBackend::calls(&backend.logout_calls), 1);
            assert_eq!(controller.state(), AuthState::Unauthenticated);
            assert_eq!(stored(&storage).await, None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_all_devices() {
        let backend = FakeBackend::new().with_verify(Script::Respond(user(1, "a@x.com")));
        let (storage, backend, controller) = controller(Some("T1"), backend).await;
        controller.bootstrap().await.unwrap();

        controller.logout_all_devices().await.unwrap();

        assert_eq!(FakeBackend::calls(&backend.logout_all_calls), 1);
        assert_eq!(FakeBackend::calls(&backend.logout_calls), 0);
        assert_eq!(*backend.revoked.lock(), vec!["T1".to_string()]);
        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&storage).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_loading_only_clears() {
        let (storage, backend, controller) = controller(Some("T1"), FakeBackend::new()).await;

        controller.logout().await.unwrap();

        assert_eq!(controller.state(), AuthState::Loading);
        assert_eq!(FakeBackend::calls(&backend.logout_calls), 0);
        assert_eq!(stored(&storage).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_unauthorized_ends_session() {
        let backend = FakeBackend::new().with_verify(Script::Respond(user(1, "a@x.com")));
        let (storage, _, controller) = controller(Some("T1"), backend).await;
        controller.bootstrap().await.unwrap();
        assert!(controller.state().is_authenticated());

        controller.handle_unauthorized().await;

        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&storage).await, None);

        // Idempotent
        controller.handle_unauthorized().await;
        assert_eq!(controller.state(), AuthState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_bootstrap_leaves_no_credential() {
        let backend = FakeBackend::new().with_verify(Script::Fail(ApiError::Unauthorized));
        let (storage, _, controller) = controller(Some("T1"), backend).await;

        let report = controller.bootstrap().await.unwrap();

        assert!(!report.session.authenticated);
        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&storage).await, None);
    }
}
