//! Order commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use deskhub_api::{Id, ListQuery, Order, OrderStatus};

pub(super) fn print_order_row(order: &Order) {
    let total = order
        .total
        .as_f64()
        .map(|t| format!("{:.2}", t))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  #{:<6} {:<12} {:>10} {:<28} {}",
        order.id.to_string(),
        order.status,
        total,
        output::truncate(order.package_name.as_deref().unwrap_or("-"), 28),
        output::truncate(order.client_name.as_deref().unwrap_or("-"), 24)
    );
}

pub async fn orders_list(
    ctx: &AppContext,
    page: Option<u32>,
    status: Option<OrderStatus>,
    search: Option<String>,
) -> Result<()> {
    ctx.require_user()?;

    let query = ListQuery {
        page,
        status: status.map(|s| s.as_str().to_string()),
        search,
    };
    let orders = ctx.call(ctx.mobile.orders(&query)).await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&orders),
        OutputFormat::Text => {
            if orders.data.is_empty() {
                println!("No orders found");
                return Ok(());
            }
            output::print_heading("Orders");
            for order in &orders.data {
                print_order_row(order);
            }
            output::print_page_footer(orders.current_page, orders.last_page, orders.total);
        }
    }
    Ok(())
}

pub async fn orders_status(ctx: &AppContext, id: Id, status: OrderStatus) -> Result<()> {
    ctx.require_user()?;
    ctx.call(ctx.mobile.update_order_status(&id, status)).await?;
    output::print_success(&format!("Order #{} marked {}", id, status), &ctx.format);
    Ok(())
}
