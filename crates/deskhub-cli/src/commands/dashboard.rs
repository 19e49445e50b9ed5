//! Dashboard and notifications.

use super::orders::print_order_row;
use super::tickets::print_ticket_row;
use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;

pub async fn dashboard(ctx: &AppContext) -> Result<()> {
    let user = ctx.require_user()?;
    let dashboard = ctx.call(ctx.mobile.dashboard()).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&dashboard),
        OutputFormat::Text => {
            let stats = &dashboard.stats;
            output::print_heading(&format!("Welcome, {}", user.display_name()));
            output::print_row(
                "Open tickets",
                &format!("{} of {}", stats.open_tickets, stats.total_tickets),
            );
            output::print_row("Pending orders", &stats.pending_orders.to_string());
            output::print_row("Orders today", &stats.today_orders.to_string());
            output::print_row("Clients", &stats.total_clients.to_string());
            if let Some(payments) = stats.recent_payments.as_f64() {
                output::print_row("Recent payments", &format!("{:.2}", payments));
            }

            if !dashboard.recent_tickets.is_empty() {
                output::print_heading("Recent tickets");
                dashboard.recent_tickets.iter().for_each(print_ticket_row);
            }
            if !dashboard.recent_orders.is_empty() {
                output::print_heading("Recent orders");
                dashboard.recent_orders.iter().for_each(print_order_row);
            }
        }
    }
    Ok(())
}

/// The notification feed has no fixed schema; it is printed as JSON in both formats.
pub async fn notifications(ctx: &AppContext) -> Result<()> {
    ctx.require_user()?;
    let feed = ctx.call(ctx.mobile.notifications()).await?;

    let empty = match &feed {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty && ctx.format == OutputFormat::Text {
        println!("No notifications");
    } else {
        output::print_json(&feed);
    }
    Ok(())
}
