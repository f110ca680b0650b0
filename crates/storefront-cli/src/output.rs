//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use serde::Serialize;
use storefront_api_models::{ListResource, Order, OrderInvoice, OrdersStatistics, UserRead};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn render_order(order: &Order, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(order),
        OutputFormat::Table => {
            let mut lines = vec![
                format!("id: {}", order.id),
                format!("amount: {}", format_amount(order.amount, &order.currency)),
                format!("tax: {}", format_amount(order.tax_amount, &order.currency)),
                format!("user: {}", order.user_id),
                format!("product: {}", order.product_id),
            ];
            if let Some(price) = &order.product_price_id {
                lines.push(format!("price: {price}"));
            }
            if let Some(subscription) = &order.subscription_id {
                lines.push(format!("subscription: {subscription}"));
            }
            lines.push(format!("created: {}", order.created_at));
            if let Some(modified) = &order.modified_at {
                lines.push(format!("modified: {modified}"));
            }
            Ok(lines.join("\n"))
        }
    }
}

pub(crate) fn render_invoice(invoice: &OrderInvoice, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(invoice),
        OutputFormat::Table => Ok(format!("invoice: {}", invoice.url)),
    }
}

pub(crate) fn render_statistics(
    stats: &OrdersStatistics,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(stats),
        OutputFormat::Table => {
            let mut lines = vec![format!("{:<10} {:>8} {:>12}", "PERIOD", "ORDERS", "EARNINGS")];
            for period in &stats.periods {
                lines.push(format!(
                    "{:<10} {:>8} {:>12}",
                    period.date,
                    period.orders,
                    format_cents(period.earnings)
                ));
            }
            lines.push(format!("total earnings: {}", format_cents(stats.total_earnings())));
            Ok(lines.join("\n"))
        }
    }
}

pub(crate) fn render_order_list(
    list: &ListResource<Order>,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(list),
        OutputFormat::Table => {
            let mut lines = vec![format!(
                "{:<36} {:>14} {:<20} CREATED",
                "ID", "AMOUNT", "PRODUCT"
            )];
            for order in &list.items {
                lines.push(format!(
                    "{:<36} {:>14} {:<20} {}",
                    order.id,
                    format_amount(order.amount, &order.currency),
                    order.product_id,
                    order.created_at.format("%Y-%m-%d")
                ));
            }
            lines.push(format!(
                "{} of {} orders (max page {})",
                list.items.len(),
                list.pagination.total_count,
                list.pagination.max_page
            ));
            Ok(lines.join("\n"))
        }
    }
}

pub(crate) fn render_user(user: &UserRead, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(user),
        OutputFormat::Table => {
            let mut lines = vec![
                format!("id: {}", user.id),
                format!("username: {}", user.username),
                format!("email: {}", user.email),
            ];
            if let Some(account) = &user.account_id {
                lines.push(format!("account: {account}"));
            }
            lines.push(format!("since: {}", user.created_at));
            Ok(lines.join("\n"))
        }
    }
}

/// Render minor currency units as `12.34 USD`.
pub(crate) fn format_amount(cents: i64, currency: &str) -> String {
    format!("{} {}", format_cents(cents), currency.to_ascii_uppercase())
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_test_support::fixtures;

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(2_500, "usd"), "25.00 USD");
        assert_eq!(format_amount(7, "eur"), "0.07 EUR");
        assert_eq!(format_amount(-1_050, "usd"), "-10.50 USD");
    }

    #[test]
    fn order_table_lists_money_fields() -> anyhow::Result<()> {
        let order: Order = serde_json::from_value(fixtures::order_json("ord_1"))?;
        let text = render_order(&order, OutputFormat::Table).map_err(|err| anyhow!("{err:?}"))?;
        assert!(text.contains("id: ord_1"));
        assert!(text.contains("amount: 25.00 USD"));
        assert!(text.contains("price: price-1"));
        assert!(!text.contains("subscription:"));
        Ok(())
    }

    #[test]
    fn list_table_keeps_server_order_and_summary() -> anyhow::Result<()> {
        let list: ListResource<Order> =
            serde_json::from_value(fixtures::order_list_json(&["b", "a"], 12))?;
        let text =
            render_order_list(&list, OutputFormat::Table).map_err(|err| anyhow!("{err:?}"))?;
        let rows: Vec<&str> = text.lines().collect();
        assert!(rows[1].starts_with('b'));
        assert!(rows[2].starts_with('a'));
        assert_eq!(rows[3], "2 of 12 orders (max page 1)");
        Ok(())
    }

    #[test]
    fn statistics_table_reports_total() -> anyhow::Result<()> {
        let stats: OrdersStatistics = serde_json::from_value(fixtures::statistics_json())?;
        let text =
            render_statistics(&stats, OutputFormat::Table).map_err(|err| anyhow!("{err:?}"))?;
        assert!(text.ends_with("total earnings: 35.00"));
        Ok(())
    }

    #[test]
    fn json_output_round_trips_payload() -> anyhow::Result<()> {
        let user: UserRead = serde_json::from_value(fixtures::user_json("user_1"))?;
        let text = render_user(&user, OutputFormat::Json).map_err(|err| anyhow!("{err:?}"))?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["username"], "octo");
        Ok(())
    }
}
