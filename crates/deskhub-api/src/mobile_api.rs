//! `/mobile/*` endpoints: dashboard, tickets, clients, orders, notifications.

use crate::types::{Id, Validate};
use crate::{ApiClient, ApiResult, PendingRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
            /// A value this client does not know about yet.
            #[serde(other)]
            Unknown,
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "unknown",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        stringify!($name),
                        other,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

wire_enum!(
    /// Ticket lifecycle status.
    TicketStatus {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
);

wire_enum!(
    TicketPriority {
        Low => "low",
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
);

wire_enum!(
    /// Order fulfilment status.
    OrderStatus {
        Pending => "pending",
        Paid => "paid",
        Provisioned => "provisioned",
        Cancelled => "cancelled",
        Failed => "failed",
    }
);

/// Money as sent by the backend: a number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n),
            Amount::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Number(0.0)
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub last_page: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.current_page.unwrap_or(1) < self.last_page.unwrap_or(1)
    }
}

impl<T> Validate for Page<T> {}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardStats {
    pub open_tickets: u64,
    pub total_tickets: u64,
    pub pending_orders: u64,
    pub today_orders: u64,
    pub total_clients: u64,
    pub recent_payments: Amount,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_tickets: Vec<Ticket>,
    pub recent_orders: Vec<Order>,
}

impl Validate for Dashboard {}

/// Client contact embedded in a ticket.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketMessage {
    pub id: Id,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Ticket {
    pub id: Id,
    #[serde(default)]
    pub subject: String,
    pub status: TicketStatus,
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client: Option<ContactInfo>,
    #[serde(default)]
    pub messages_count: Option<u64>,
    #[serde(default)]
    pub last_reply: Option<String>,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_priority() -> TicketPriority {
    TicketPriority::Normal
}

impl Validate for Ticket {}

#[derive(Debug, Clone, Deserialize)]
struct TicketMessageResponse {
    ticket_message: TicketMessage,
}

impl Validate for TicketMessageResponse {}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Client {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub orders_count: Option<u64>,
    #[serde(default)]
    pub tickets_count: Option<u64>,
    #[serde(default)]
    pub invoices_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Validate for Client {}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Order {
    pub id: Id,
    pub status: OrderStatus,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub total: Amount,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Validate for Order {}

/// Filters for `GET /mobile/tickets`.
#[derive(Debug, Clone, Default)]
pub struct TicketQuery {
    pub page: Option<u32>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub search: Option<String>,
}

/// Filters for the client and order lists.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone)]
pub struct MobileApi {
    client: ApiClient,
}

impl MobileApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn dashboard(&self) -> ApiResult<Dashboard> {
        self.client
            .send(PendingRequest::get("/mobile/dashboard"))
            .await
    }

    pub async fn tickets(&self, query: &TicketQuery) -> ApiResult<Page<Ticket>> {
        let request = PendingRequest::get("/mobile/tickets")
            .with_query("page", query.page)
            .with_query("status", query.status)
            .with_query("priority", query.priority)
            .with_query("search", non_blank(&query.search));
        self.client.send(request).await
    }

    pub async fn ticket(&self, id: &Id) -> ApiResult<Ticket> {
        self.client
            .send(PendingRequest::get(format!("/mobile/tickets/{}", id)))
            .await
    }

    pub async fn update_ticket_status(&self, id: &Id, status: TicketStatus) -> ApiResult<()> {
        let request = PendingRequest::put(format!("/mobile/tickets/{}", id))
            .with_json(&serde_json::json!({ "status": status }))?;
        self.client.send_empty(request).await
    }

    /// Post a staff reply and return the stored message.
    pub async fn add_ticket_message(&self, id: &Id, content: &str) -> ApiResult<TicketMessage> {
        let request = PendingRequest::post(format!("/mobile/tickets/{}/messages", id))
            .with_json(&serde_json::json!({ "content": content.trim() }))?;
        let response: TicketMessageResponse = self.client.send(request).await?;
        Ok(response.ticket_message)
    }

    pub async fn clients(&self, query: &ListQuery) -> ApiResult<Page<Client>> {
        let request = PendingRequest::get("/mobile/clients")
            .with_query("page", query.page)
            .with_query("status", non_blank(&query.status))
            .with_query("search", non_blank(&query.search));
        self.client.send(request).await
    }

    pub async fn client(&self, id: &Id) -> ApiResult<Client> {
        self.client
            .send(PendingRequest::get(format!("/mobile/clients/{}", id)))
            .await
    }

    pub async fn orders(&self, query: &ListQuery) -> ApiResult<Page<Order>> {
        let request = PendingRequest::get("/mobile/orders")
            .with_query("page", query.page)
            .with_query("status", non_blank(&query.status))
            .with_query("search", non_blank(&query.search));
        self.client.send(request).await
    }

    pub async fn update_order_status(&self, id: &Id, status: OrderStatus) -> ApiResult<()> {
        let request = PendingRequest::put(format!("/mobile/orders/{}", id))
            .with_json(&serde_json::json!({ "status": status }))?;
        self.client.send_empty(request).await
    }

    /// Notifications are passed through untyped.
    pub async fn notifications(&self) -> ApiResult<serde_json::Value> {
        self.client
            .send(PendingRequest::get("/mobile/notifications"))
            .await
    }
}
