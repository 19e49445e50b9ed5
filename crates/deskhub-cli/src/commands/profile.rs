//! Profile and device session commands.

use super::{confirm, AppContext};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use deskhub_api::{Id, PasswordChange, ProfileUpdate, UserProfile};

fn print_profile(user: &UserProfile, format: &OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(user),
        OutputFormat::Text => {
            output::print_heading("Profile");
            output::print_row("Name", user.display_name());
            output::print_row("Email", &user.email);
            output::print_row("ID", &user.id.to_string());
            output::print_opt_row("Role", user.role.as_deref());
            output::print_opt_row("Phone", user.phone.as_deref());
        }
    }
}

pub async fn profile_show(ctx: &AppContext) -> Result<()> {
    ctx.require_user()?;
    let user = ctx.call(ctx.auth.profile()).await?;
    print_profile(&user, &ctx.format);
    Ok(())
}

pub async fn profile_update(
    ctx: &AppContext,
    name: Option<String>,
    phone: Option<String>,
) -> Result<()> {
    ctx.require_user()?;
    if name.is_none() && phone.is_none() {
        anyhow::bail!("Nothing to update. Pass --name and/or --phone");
    }

    let update = ProfileUpdate { name, phone };
    let user = ctx.call(ctx.auth.update_profile(&update)).await?;

    if ctx.format == OutputFormat::Text {
        println!("Profile updated");
    }
    print_profile(&user, &ctx.format);
    Ok(())
}

/// Change password. All three values are read without echo.
pub async fn profile_password(ctx: &AppContext) -> Result<()> {
    ctx.require_user()?;

    let current = rpassword::prompt_password("Current password: ")?;
    let new = rpassword::prompt_password("New password: ")?;
    let confirmation = rpassword::prompt_password("Confirm new password: ")?;

    if current.is_empty() || new.is_empty() {
        anyhow::bail!("Password is required");
    }
    if new != confirmation {
        anyhow::bail!("New passwords do not match");
    }

    ctx.call(ctx.auth.change_password(&PasswordChange::new(current, new)))
        .await?;
    output::print_success("Password changed", &ctx.format);
    Ok(())
}

/// List device sessions of the current user.
pub async fn sessions_list(ctx: &AppContext) -> Result<()> {
    ctx.require_user()?;
    let sessions = ctx.call(ctx.auth.sessions()).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&sessions),
        OutputFormat::Text => {
            if sessions.is_empty() {
                println!("No active sessions");
                return Ok(());
            }
            output::print_heading("Device sessions");
            for session in &sessions {
                println!(
                    "  {:<8} {:<32} {:<22} {}",
                    session.id.to_string(),
                    output::truncate(session.name.as_deref().unwrap_or("unnamed"), 32),
                    session.last_used_at.as_deref().unwrap_or("-"),
                    if session.is_current { "(this device)" } else { "" }
                );
            }
        }
    }
    Ok(())
}

/// Revoke one device session.
pub async fn sessions_revoke(ctx: &AppContext, id: Id, yes: bool) -> Result<()> {
    ctx.require_user()?;

    if !yes && !confirm(&format!("Revoke session {}?", id)) {
        output::print_success("Cancelled", &ctx.format);
        return Ok(());
    }

    ctx.call(ctx.auth.revoke_session(&id)).await?;
    output::print_success(&format!("Session {} revoked", id), &ctx.format);
    Ok(())
}
