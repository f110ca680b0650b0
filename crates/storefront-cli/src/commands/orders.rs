//! `orders` subcommands.

use storefront_client::resources::orders::{ListOrdersRequest, OrdersStatisticsRequest};

use crate::cli::{OrderIdArgs, OrdersListArgs, OrdersStatsArgs};
use crate::client::{AppContext, CliResult, classify_client_error};
use crate::output::{render_invoice, render_order, render_order_list, render_statistics};

pub(crate) async fn handle_orders_get(ctx: &AppContext, args: OrderIdArgs) -> CliResult<String> {
    let order = ctx
        .api
        .orders()
        .get_order(&args.id)
        .await
        .map_err(classify_client_error)?;
    render_order(&order, ctx.format)
}

pub(crate) async fn handle_orders_invoice(
    ctx: &AppContext,
    args: OrderIdArgs,
) -> CliResult<String> {
    let invoice = ctx
        .api
        .orders()
        .get_order_invoice(&args.id)
        .await
        .map_err(classify_client_error)?;
    render_invoice(&invoice, ctx.format)
}

pub(crate) async fn handle_orders_stats(
    ctx: &AppContext,
    args: OrdersStatsArgs,
) -> CliResult<String> {
    let request = OrdersStatisticsRequest {
        organization_id: args.organization_id,
        product_id: args.product_id,
    };
    let stats = ctx
        .api
        .orders()
        .get_orders_statistics(request)
        .await
        .map_err(classify_client_error)?;
    render_statistics(&stats, ctx.format)
}

pub(crate) async fn handle_orders_list(
    ctx: &AppContext,
    args: OrdersListArgs,
) -> CliResult<String> {
    let list = ctx
        .api
        .orders()
        .list_orders(list_request(args))
        .await
        .map_err(classify_client_error)?;
    render_order_list(&list, ctx.format)
}

/// Sort keys are forwarded in the order given on the command line.
fn list_request(args: OrdersListArgs) -> ListOrdersRequest {
    ListOrdersRequest {
        organization_id: args.organization_id,
        product_id: args.product_id,
        product_price_type: args.price_type.map(Into::into),
        user_id: args.user_id,
        page: args.page,
        limit: args.limit,
        sorting: (!args.sorting.is_empty()).then_some(args.sorting),
    }
}
