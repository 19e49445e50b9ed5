//! Authentication commands.

use super::{notice_error, prompt, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use deskhub_auth::{AuthState, Resolution};

/// Login with email and password.
pub async fn login(ctx: &AppContext, email: Option<String>) -> Result<()> {
    if let AuthState::Authenticated(user) = ctx.controller.state() {
        output::print_success(
            &format!("Already logged in as {}", user.email),
            &ctx.format,
        );
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    if email.trim().is_empty() {
        anyhow::bail!("Email is required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    if ctx.format == OutputFormat::Text {
        println!("Logging in...");
    }

    match ctx.controller.login(&email, &password).await {
        Ok(session) => {
            match (&ctx.format, session.user) {
                (OutputFormat::Json, user) => output::print_json(&serde_json::json!({
                    "status": "success",
                    "authenticated": true,
                    "user": user,
                })),
                (OutputFormat::Text, Some(user)) => println!(
                    "Logged in as {} <{}>",
                    user.display_name(),
                    user.email
                ),
                (OutputFormat::Text, None) => println!("Logged in successfully"),
            }
            Ok(())
        }
        Err(e) => Err(notice_error(&e)),
    }
}

/// Logout and clear session.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    let was_authenticated = ctx.controller.state().is_authenticated();
    ctx.controller.logout().await?;

    if was_authenticated {
        output::print_success("Logged out successfully", &ctx.format);
    } else {
        output::print_success("Not logged in", &ctx.format);
    }
    Ok(())
}

/// Logout from every device.
pub async fn logout_all(ctx: &AppContext) -> Result<()> {
    ctx.require_user()?;
    ctx.controller.logout_all_devices().await?;
    output::print_success("Logged out from all devices", &ctx.format);
    Ok(())
}

/// Check authentication status.
pub async fn status(ctx: &AppContext) -> Result<()> {
    let session = ctx.controller.current_session();

    match ctx.format {
        OutputFormat::Text => {
            match &session.user {
                Some(user) => {
                    println!("Auth:     logged in");
                    println!("User:     {}", user.display_name());
                    println!("Email:    {}", user.email);
                    println!("User ID:  {}", user.id);
                    if let Some(role) = &user.role {
                        println!("Role:     {}", role);
                    }
                }
                None => println!("Auth:     not logged in"),
            }
            let check = match &ctx.report.resolution {
                Resolution::NoCredential => "no stored session".to_string(),
                Resolution::Verified => "verified with server".to_string(),
                Resolution::Rejected(reason) => format!("rejected ({})", reason),
                Resolution::VerifyTimedOut => "server did not answer in time".to_string(),
                Resolution::DeadlineElapsed => "startup deadline elapsed".to_string(),
                Resolution::Faulted => "internal error during check".to_string(),
            };
            println!(
                "Check:    {} in {} ms",
                check,
                ctx.report.elapsed.as_millis()
            );
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "authenticated": session.authenticated,
            "user": session.user,
            "bootstrap": ctx.report,
        })),
    }

    Ok(())
}
