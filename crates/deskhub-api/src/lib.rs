//! HTTP access to the NM-DigitalHUB backend.
//!
//! Every call goes through one [`ApiClient`], which attaches the stored bearer
//! credential and transparently refreshes it once on a 401. Endpoint groups
//! ([`AuthApi`], [`MobileApi`]) are thin typed wrappers around it.

mod auth_api;
mod client;
mod error;
mod mobile_api;
mod pending;
pub mod types;

pub use auth_api::AuthApi;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult, Suspension};
pub use mobile_api::{
    Amount, Client, ContactInfo, Dashboard, DashboardStats, ListQuery, MobileApi, Order,
    OrderStatus, Page, Ticket, TicketMessage, TicketPriority, TicketQuery, TicketStatus,
};
pub use pending::PendingRequest;
pub use types::{
    DeviceSession, Id, LoginRequest, LoginResponse, PasswordChange, ProfileUpdate, UserProfile,
    Validate,
};
