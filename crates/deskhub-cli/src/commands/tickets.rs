//! Support ticket commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use deskhub_api::{Id, Ticket, TicketPriority, TicketQuery, TicketStatus};

fn client_label(ticket: &Ticket) -> &str {
    ticket
        .client_name
        .as_deref()
        .or_else(|| ticket.client.as_ref().and_then(|c| c.name.as_deref()))
        .unwrap_or("-")
}

/// One line of a ticket table.
pub(super) fn print_ticket_row(ticket: &Ticket) {
    println!(
        "  #{:<6} {:<12} {:<7} {:<36} {}",
        ticket.id.to_string(),
        ticket.status,
        ticket.priority,
        output::truncate(&ticket.subject, 36),
        output::truncate(client_label(ticket), 24)
    );
}

pub async fn tickets_list(
    ctx: &AppContext,
    page: Option<u32>,
    status: Option<TicketStatus>,
    priority: Option<TicketPriority>,
    search: Option<String>,
) -> Result<()> {
    ctx.require_user()?;

    let query = TicketQuery {
        page,
        status,
        priority,
        search,
    };
    let tickets = ctx.call(ctx.mobile.tickets(&query)).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&tickets),
        OutputFormat::Text => {
            if tickets.data.is_empty() {
                println!("No tickets found");
                return Ok(());
            }
            output::print_heading("Tickets");
            for ticket in &tickets.data {
                print_ticket_row(ticket);
            }
            output::print_page_footer(tickets.current_page, tickets.last_page, tickets.total);
        }
    }
    Ok(())
}

pub async fn tickets_show(ctx: &AppContext, id: Id) -> Result<()> {
    ctx.require_user()?;
    let ticket = ctx.call(ctx.mobile.ticket(&id)).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&ticket),
        OutputFormat::Text => {
            output::print_heading(&format!("Ticket #{}: {}", ticket.id, ticket.subject));
            output::print_row("Status", ticket.status.as_str());
            output::print_row("Priority", ticket.priority.as_str());
            output::print_row("Client", client_label(&ticket));
            let email = ticket
                .client_email
                .as_deref()
                .or_else(|| ticket.client.as_ref().and_then(|c| c.email.as_deref()));
            output::print_opt_row("Email", email);
            output::print_opt_row(
                "Phone",
                ticket.client.as_ref().and_then(|c| c.phone.as_deref()),
            );
            output::print_opt_row("Created", ticket.created_at.as_deref());
            output::print_opt_row("Updated", ticket.updated_at.as_deref());

            if !ticket.messages.is_empty() {
                output::print_heading("Messages");
                for message in &ticket.messages {
                    let sender = message.sender_name.as_deref().unwrap_or(if message.is_admin {
                        "Staff"
                    } else {
                        "Client"
                    });
                    println!(
                        "[{}] {}",
                        message.created_at.as_deref().unwrap_or("-"),
                        sender
                    );
                    println!("{}\n", message.content.trim());
                }
            }
        }
    }
    Ok(())
}

pub async fn tickets_status(ctx: &AppContext, id: Id, status: TicketStatus) -> Result<()> {
    ctx.require_user()?;
    ctx.call(ctx.mobile.update_ticket_status(&id, status))
        .await?;
    output::print_success(
        &format!("Ticket #{} marked {}", id, status),
        &ctx.format,
    );
    Ok(())
}

pub async fn tickets_reply(ctx: &AppContext, id: Id, message: String) -> Result<()> {
    ctx.require_user()?;
    if message.trim().is_empty() {
        anyhow::bail!("Message is required");
    }

    let reply = ctx
        .call(ctx.mobile.add_ticket_message(&id, message.trim()))
        .await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&reply),
        OutputFormat::Text => println!("Reply {} added to ticket #{}", reply.id, id),
    }
    Ok(())
}
