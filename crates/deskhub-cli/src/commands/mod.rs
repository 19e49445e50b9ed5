//! CLI command implementations.

mod auth;
mod clients;
mod dashboard;
mod orders;
mod profile;
mod tickets;

pub use auth::{login, logout, logout_all, status};
pub use clients::{clients_list, clients_show};
pub use dashboard::{dashboard, notifications};
pub use orders::{orders_list, orders_status};
pub use profile::{
    profile_password, profile_show, profile_update, sessions_list, sessions_revoke,
};
pub use tickets::{tickets_list, tickets_reply, tickets_show, tickets_status};

use crate::output::{self, OutputFormat};
use anyhow::{anyhow, Result};
use deskhub_api::{ApiClient, ApiError, ApiResult, AuthApi, MobileApi, UserProfile};
use deskhub_auth::{
    AuthError, BootstrapPhase, BootstrapReport, Resolution, SessionController, SessionSettings,
};
use deskhub_config::{Config, Paths};
use deskhub_storage::{create_storage, CredentialStore};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs: the API groups and the restored session.
pub struct AppContext {
    pub format: OutputFormat,
    pub auth: AuthApi,
    pub mobile: MobileApi,
    pub controller: SessionController,
    pub report: BootstrapReport,
}

impl AppContext {
    /// Wire the client together and run the startup session check.
    pub async fn start(config: &Config, paths: &Paths, format: OutputFormat) -> Result<Self> {
        let credentials = CredentialStore::new(
            create_storage(paths),
            config.timeouts.storage_timeout(),
        );
        let client = ApiClient::from_config(config, credentials.clone())?;
        let auth = AuthApi::new(client.clone());
        let mobile = MobileApi::new(client);

        let controller = SessionController::new(
            Arc::new(auth.clone()),
            credentials,
            SessionSettings::from_config(config),
        );

        let report = splash(&controller, format).await?;
        debug!(
            resolution = ?report.resolution,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Session check finished"
        );

        if matches!(report.resolution, Resolution::Rejected(_)) {
            output::print_notice(&AuthError::NotAuthenticated.notice(), &format);
        }

        Ok(Self {
            format,
            auth,
            mobile,
            controller,
            report,
        })
    }

    /// The logged-in user, or an error telling the user to log in.
    pub fn require_user(&self) -> Result<UserProfile> {
        self.controller
            .state()
            .user()
            .cloned()
            .ok_or_else(|| anyhow!("Not logged in. Run 'deskhub login' first"))
    }

    /// Await an API call. A revoked credential ends the session locally.
    pub async fn call<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        match request.await {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized) => {
                self.controller.handle_unauthorized().await;
                Err(notice_error(&AuthError::NotAuthenticated))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Turn an auth failure into its user-facing message.
pub fn notice_error(err: &AuthError) -> anyhow::Error {
    let notice = err.notice();
    anyhow!("{}. {}", notice.title, notice.description)
}

/// Run bootstrap while reporting its phases, like a splash screen would.
async fn splash(controller: &SessionController, format: OutputFormat) -> Result<BootstrapReport> {
    let bootstrap = controller.new_bootstrap();
    let mut phases = bootstrap.phases();

    let watch_phases = async move {
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            debug!(phase = ?phase, "Bootstrap phase");
            if phase == BootstrapPhase::Verifying && format == OutputFormat::Text {
                eprintln!("Checking session...");
            }
            if phase.is_resolved() {
                break;
            }
        }
    };

    let (report, ()) = tokio::join!(controller.bootstrap_with(bootstrap), watch_phases);
    Ok(report?)
}

/// Read one line from stdin after a prompt.
fn prompt(label: &str) -> Result<String> {
    use std::io::{self, Write};

    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Ask user for confirmation.
fn confirm(question: &str) -> bool {
    match prompt(&format!("{} [y/N] ", question)) {
        Ok(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
