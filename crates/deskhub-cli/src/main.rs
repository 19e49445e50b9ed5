//! deskhub - command-line support desk for NM-DigitalHUB staff.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use deskhub_api::{Id, OrderStatus, TicketPriority, TicketStatus};
use deskhub_config::{init_logging, Config, Paths};
use std::path::PathBuf;
use tracing::debug;

/// deskhub - Work the NM-DigitalHUB support desk from a terminal.
#[derive(Parser)]
#[command(name = "deskhub")]
#[command(about = "NM-DigitalHUB support desk for staff: tickets, clients, orders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Data directory (defaults to ~/.deskhub)
    #[arg(long, global = true)]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check authentication status
    Status,

    /// Login with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear session
    Logout,

    /// Logout from every device
    LogoutAll,

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage device sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Show desk statistics and recent activity
    Dashboard,

    /// Manage support tickets
    Tickets {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Browse clients
    Clients {
        #[command(subcommand)]
        command: ClientCommands,
    },

    /// Manage orders
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },

    /// Show notifications
    Notifications,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update contact details
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change your password
    Password,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List devices logged in to your account
    List,
    /// Revoke a device session
    Revoke {
        /// Session ID
        id: Id,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TicketCommands {
    /// List tickets
    List {
        #[arg(short, long)]
        page: Option<u32>,
        /// open, in_progress, resolved, closed
        #[arg(short, long)]
        status: Option<TicketStatus>,
        /// low, normal, high, urgent
        #[arg(long)]
        priority: Option<TicketPriority>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show ticket details and messages
    Show {
        /// Ticket ID
        id: Id,
    },
    /// Change ticket status
    Status {
        /// Ticket ID
        id: Id,
        /// open, in_progress, resolved, closed
        status: TicketStatus,
    },
    /// Reply to a ticket
    Reply {
        /// Ticket ID
        id: Id,
        /// Message text
        message: String,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// List clients
    List {
        #[arg(short, long)]
        page: Option<u32>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show client details
    Show {
        /// Client ID
        id: Id,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// List orders
    List {
        #[arg(short, long)]
        page: Option<u32>,
        /// pending, paid, provisioned, cancelled, failed
        #[arg(short, long)]
        status: Option<OrderStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Change order status
    Status {
        /// Order ID
        id: Id,
        /// pending, paid, provisioned, cancelled, failed
        status: OrderStatus,
    },
}

/// Resolve paths and config. Flags override file and environment.
fn load_config(cli: &Cli) -> Result<(Paths, Config)> {
    let paths = match &cli.home {
        Some(home) => Paths::with_base_dir(home.clone()),
        None => Paths::new()?,
    };

    let mut config = Config::load(&paths)?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    config.validate()?;

    Ok((paths, config))
}

async fn run(cli: Cli) -> Result<()> {
    let (paths, config) = load_config(&cli)?;
    init_logging(&config.log_level, &paths, false)?;
    debug!(api_url = %config.api_url, home = %paths.base_dir().display(), "Starting");

    let ctx = commands::AppContext::start(&config, &paths, cli.format).await?;

    match cli.command {
        Commands::Status => commands::status(&ctx).await,
        Commands::Login { email } => commands::login(&ctx, email).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::LogoutAll => commands::logout_all(&ctx).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile_show(&ctx).await,
            ProfileCommands::Update { name, phone } => {
                commands::profile_update(&ctx, name, phone).await
            }
            ProfileCommands::Password => commands::profile_password(&ctx).await,
        },
        Commands::Sessions { command } => match command {
            SessionCommands::List => commands::sessions_list(&ctx).await,
            SessionCommands::Revoke { id, yes } => commands::sessions_revoke(&ctx, id, yes).await,
        },
        Commands::Dashboard => commands::dashboard(&ctx).await,
        Commands::Tickets { command } => match command {
            TicketCommands::List {
                page,
                status,
                priority,
                search,
            } => commands::tickets_list(&ctx, page, status, priority, search).await,
            TicketCommands::Show { id } => commands::tickets_show(&ctx, id).await,
            TicketCommands::Status { id, status } => {
                commands::tickets_status(&ctx, id, status).await
            }
            TicketCommands::Reply { id, message } => {
                commands::tickets_reply(&ctx, id, message).await
            }
        },
        Commands::Clients { command } => match command {
            ClientCommands::List {
                page,
                status,
                search,
            } => commands::clients_list(&ctx, page, status, search).await,
            ClientCommands::Show { id } => commands::clients_show(&ctx, id).await,
        },
        Commands::Orders { command } => match command {
            OrderCommands::List {
                page,
                status,
                search,
            } => commands::orders_list(&ctx, page, status, search).await,
            OrderCommands::Status { id, status } => {
                commands::orders_status(&ctx, id, status).await
            }
        },
        Commands::Notifications => commands::notifications(&ctx).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
