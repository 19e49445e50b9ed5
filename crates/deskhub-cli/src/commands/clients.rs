//! Client directory commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use deskhub_api::{Id, ListQuery};

pub async fn clients_list(
    ctx: &AppContext,
    page: Option<u32>,
    status: Option<String>,
    search: Option<String>,
) -> Result<()> {
    ctx.require_user()?;

    let query = ListQuery {
        page,
        status,
        search,
    };
    let clients = ctx.call(ctx.mobile.clients(&query)).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&clients),
        OutputFormat::Text => {
            if clients.data.is_empty() {
                println!("No clients found");
                return Ok(());
            }
            output::print_heading("Clients");
            for client in &clients.data {
                println!(
                    "  {:<7} {:<28} {:<32} {}",
                    client.id.to_string(),
                    output::truncate(client.name.as_deref().unwrap_or("-"), 28),
                    output::truncate(client.email.as_deref().unwrap_or("-"), 32),
                    client.status.as_deref().unwrap_or("")
                );
            }
            output::print_page_footer(clients.current_page, clients.last_page, clients.total);
        }
    }
    Ok(())
}

pub async fn clients_show(ctx: &AppContext, id: Id) -> Result<()> {
    ctx.require_user()?;
    let client = ctx.call(ctx.mobile.client(&id)).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&client),
        OutputFormat::Text => {
            output::print_heading(&format!(
                "Client {}",
                client.name.as_deref().unwrap_or("(unnamed)")
            ));
            output::print_row("ID", &client.id.to_string());
            output::print_opt_row("Email", client.email.as_deref());
            output::print_opt_row("Phone", client.phone.as_deref());
            output::print_opt_row("Status", client.status.as_deref());
            output::print_opt_row("Last login", client.last_login.as_deref());
            output::print_opt_row("Created", client.created_at.as_deref());
            for (label, count) in [
                ("Orders", client.orders_count),
                ("Tickets", client.tickets_count),
                ("Invoices", client.invoices_count),
            ] {
                if let Some(count) = count {
                    output::print_row(label, &count.to_string());
                }
            }
        }
    }
    Ok(())
}
