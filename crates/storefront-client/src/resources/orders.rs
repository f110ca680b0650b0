//! Orders: single lookup, invoice, statistics, and listing.

use storefront_api_models::{ListResource, Order, OrderInvoice, OrdersStatistics, ProductPriceType};

use crate::descriptor::{HTTP_BEARER, HttpMethod, OperationDescriptor, ParamSpec};
use crate::error::ClientResult;
use crate::facade::{ApiFacade, Endpoint, IntoParams};
use crate::params::RequestParams;

/// Prefix marking a descending sort field.
pub const DESCENDING_PREFIX: char = '-';

/// `GET /api/v1/orders/{id}`
pub static GET_ORDER: OperationDescriptor = OperationDescriptor {
    id: "orders:get_order",
    method: HttpMethod::Get,
    path: "/api/v1/orders/{id}",
    params: &[ParamSpec::path("id")],
    security: Some(HTTP_BEARER),
};

/// `GET /api/v1/orders/{id}/invoice`
pub static GET_ORDER_INVOICE: OperationDescriptor = OperationDescriptor {
    id: "orders:get_order_invoice",
    method: HttpMethod::Get,
    path: "/api/v1/orders/{id}/invoice",
    params: &[ParamSpec::path("id")],
    security: Some(HTTP_BEARER),
};

/// `GET /api/v1/orders/statistics`
pub static GET_ORDERS_STATISTICS: OperationDescriptor = OperationDescriptor {
    id: "orders:get_orders_statistics",
    method: HttpMethod::Get,
    path: "/api/v1/orders/statistics",
    params: &[
        ParamSpec::query("organization_id"),
        ParamSpec::query("product_id"),
    ],
    security: Some(HTTP_BEARER),
};

/// `GET /api/v1/orders/`
pub static LIST_ORDERS: OperationDescriptor = OperationDescriptor {
    id: "orders:list_orders",
    method: HttpMethod::Get,
    path: "/api/v1/orders/",
    params: &[
        ParamSpec::query("organization_id"),
        ParamSpec::query("product_id"),
        ParamSpec::query("product_price_type"),
        ParamSpec::query("user_id"),
        ParamSpec::query("page"),
        ParamSpec::query("limit"),
        ParamSpec::query("sorting"),
    ],
    security: Some(HTTP_BEARER),
};

/// Typed [`GET_ORDER`].
pub const GET_ORDER_ENDPOINT: Endpoint<GetOrderRequest, Order> = Endpoint::new(&GET_ORDER);
/// Typed [`GET_ORDER_INVOICE`].
pub const GET_ORDER_INVOICE_ENDPOINT: Endpoint<GetOrderRequest, OrderInvoice> =
    Endpoint::new(&GET_ORDER_INVOICE);
/// Typed [`GET_ORDERS_STATISTICS`].
pub const GET_ORDERS_STATISTICS_ENDPOINT: Endpoint<OrdersStatisticsRequest, OrdersStatistics> =
    Endpoint::new(&GET_ORDERS_STATISTICS);
/// Typed [`LIST_ORDERS`].
pub const LIST_ORDERS_ENDPOINT: Endpoint<ListOrdersRequest, ListResource<Order>> =
    Endpoint::new(&LIST_ORDERS);

/// Identifies one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOrderRequest {
    /// Order id; blank counts as missing.
    pub id: String,
}

impl GetOrderRequest {
    /// Request for order `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl IntoParams for GetOrderRequest {
    fn into_params(self) -> RequestParams {
        RequestParams::new().with("id", self.id)
    }
}

/// Filters for order statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersStatisticsRequest {
    /// Restrict to one organization.
    pub organization_id: Option<String>,
    /// Restrict to one product.
    pub product_id: Option<String>,
}

impl IntoParams for OrdersStatisticsRequest {
    fn into_params(self) -> RequestParams {
        RequestParams::new()
            .with_opt("organization_id", self.organization_id)
            .with_opt("product_id", self.product_id)
    }
}

/// Filters, pagination, and sort order for listing orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOrdersRequest {
    /// Restrict to one organization.
    pub organization_id: Option<String>,
    /// Restrict to one product.
    pub product_id: Option<String>,
    /// Restrict to one price type.
    pub product_price_type: Option<ProductPriceType>,
    /// Restrict to one customer.
    pub user_id: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Sort fields in priority order; a leading `-` sorts descending.
    pub sorting: Option<Vec<String>>,
}

impl ListOrdersRequest {
    /// Append an ascending sort field.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sorting.get_or_insert_with(Vec::new).push(field.into());
        self
    }

    /// Append a descending sort field.
    #[must_use]
    pub fn sort_by_desc(self, field: impl AsRef<str>) -> Self {
        self.sort_by(format!("{DESCENDING_PREFIX}{}", field.as_ref()))
    }

    /// Select a page and page size.
    #[must_use]
    pub const fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }
}

impl IntoParams for ListOrdersRequest {
    fn into_params(self) -> RequestParams {
        RequestParams::new()
            .with_opt("organization_id", self.organization_id)
            .with_opt("product_id", self.product_id)
            .with_opt("product_price_type", self.product_price_type)
            .with_opt("user_id", self.user_id)
            .with_opt("page", self.page)
            .with_opt("limit", self.limit)
            .with_opt("sorting", self.sorting)
    }
}

/// Typed operations on orders.
#[derive(Debug, Clone, Copy)]
pub struct OrdersApi<'a> {
    facade: &'a ApiFacade,
}

impl<'a> OrdersApi<'a> {
    pub(crate) const fn new(facade: &'a ApiFacade) -> Self {
        Self { facade }
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// [`crate::ClientError::MissingParameter`] for a blank id, otherwise the
    /// kind matching the response classification.
    pub async fn get_order(&self, id: &str) -> ClientResult<Order> {
        self.facade
            .call(GET_ORDER_ENDPOINT, GetOrderRequest::new(id))
            .await
    }

    /// Fetch the invoice of one order.
    ///
    /// # Errors
    ///
    /// As [`Self::get_order`].
    pub async fn get_order_invoice(&self, id: &str) -> ClientResult<OrderInvoice> {
        self.facade
            .call(GET_ORDER_INVOICE_ENDPOINT, GetOrderRequest::new(id))
            .await
    }

    /// Fetch earnings and order counts per period.
    ///
    /// # Errors
    ///
    /// The kind matching the response classification.
    pub async fn get_orders_statistics(
        &self,
        request: OrdersStatisticsRequest,
    ) -> ClientResult<OrdersStatistics> {
        self.facade
            .call(GET_ORDERS_STATISTICS_ENDPOINT, request)
            .await
    }

    /// List orders.
    ///
    /// # Errors
    ///
    /// The kind matching the response classification.
    pub async fn list_orders(&self, request: ListOrdersRequest) -> ClientResult<ListResource<Order>> {
        self.facade.call(LIST_ORDERS_ENDPOINT, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenResolver;
    use crate::error::{ClientError, ErrorKind, TransportError};
    use crate::executor::HttpExecutor;
    use crate::request::WireRequest;
    use crate::transport::{RawResponse, ReqwestTransport, Transport};
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use storefront_test_support::fixtures;
    use url::Url;

    fn facade_for(server: &MockServer, token: Option<&str>) -> anyhow::Result<ApiFacade> {
        let transport = ReqwestTransport::new(reqwest::Client::new(), Url::parse(&server.base_url())?);
        Ok(ApiFacade::new(HttpExecutor::new(
            Arc::new(transport),
            TokenResolver::from_static(token.map(ToString::to_string)),
        )))
    }

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn send(&self, _request: WireRequest) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Unavailable {
                reason: "unexpected call".into(),
            })
        }
    }

    #[tokio::test]
    async fn get_order_sends_bearer_token_and_decodes() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/orders/ord_1")
                .header("authorization", "Bearer T");
            then.status(200).json_body(fixtures::order_json("ord_1"));
        });

        let facade = facade_for(&server, Some("T"))?;
        let order = facade.orders().get_order("ord_1").await?;

        mock.assert();
        assert_eq!(order.id, "ord_1");
        assert_eq!(order.amount, 2500);
        Ok(())
    }

    #[tokio::test]
    async fn get_order_invoice_uses_the_sub_resource_path() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/orders/ord_1/invoice");
            then.status(200)
                .json_body(fixtures::invoice_json("https://files.example.com/inv.pdf"));
        });

        let invoice = facade_for(&server, None)?
            .orders()
            .get_order_invoice("ord_1")
            .await?;

        mock.assert();
        assert_eq!(invoice.url, "https://files.example.com/inv.pdf");
        Ok(())
    }

    #[tokio::test]
    async fn blank_id_fails_without_network() {
        let transport = Arc::new(CountingTransport::default());
        let facade = ApiFacade::new(HttpExecutor::new(
            transport.clone(),
            TokenResolver::anonymous(),
        ));

        let order = facade.orders().get_order("").await;
        let invoice = facade.orders().get_order_invoice(" ").await;

        assert!(matches!(
            order,
            Err(ClientError::MissingParameter {
                name: "id",
                operation: "orders:get_order"
            })
        ));
        assert_eq!(
            invoice.err().map(|err| err.kind()),
            Some(ErrorKind::MissingParameter)
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn statistics_sends_only_supplied_filters() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/orders/statistics")
                .query_param("organization_id", "org_1");
            then.status(200).json_body(fixtures::statistics_json());
        });

        let facade = facade_for(&server, None)?;
        let request = OrdersStatisticsRequest {
            organization_id: Some("org_1".into()),
            product_id: None,
        };
        let prepared = facade.prepare(GET_ORDERS_STATISTICS_ENDPOINT, request.clone())?;
        assert_eq!(
            prepared.wire().path_and_query(),
            "/api/v1/orders/statistics?organization_id=org_1"
        );
        let stats = facade.orders().get_orders_statistics(request).await?;

        mock.assert();
        assert_eq!(stats.periods.len(), 2);
        assert_eq!(stats.total_earnings(), 3500);
        Ok(())
    }

    #[tokio::test]
    async fn list_orders_preserves_sort_order_verbatim() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let facade = facade_for(&server, None)?;
        let request = ListOrdersRequest {
            organization_id: Some("org_1".into()),
            product_price_type: Some(ProductPriceType::Recurring),
            ..ListOrdersRequest::default()
        }
        .paginate(2, 10)
        .sort_by_desc("created_at")
        .sort_by("amount");

        let prepared = facade.prepare(LIST_ORDERS_ENDPOINT, request.clone())?;
        assert_eq!(
            prepared.wire().query_string(),
            "organization_id=org_1&product_price_type=recurring&page=2&limit=10&sorting=-created_at&sorting=amount"
        );

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/orders/")
                .query_param("page", "2")
                .query_param("limit", "10")
                .query_param("sorting", "-created_at")
                .query_param("sorting", "amount");
            then.status(200)
                .json_body(fixtures::order_list_json(&["ord_1", "ord_2"], 12));
        });
        let page = facade.orders().list_orders(request).await?;

        mock.assert();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total_count, 12);
        Ok(())
    }

    #[test]
    fn empty_list_request_has_no_query() -> ClientResult<()> {
        let facade = ApiFacade::new(HttpExecutor::new(
            Arc::new(CountingTransport::default()),
            TokenResolver::anonymous(),
        ));
        let prepared = facade.prepare(LIST_ORDERS_ENDPOINT, ListOrdersRequest::default())?;
        assert_eq!(prepared.wire().path_and_query(), "/api/v1/orders/");
        Ok(())
    }

    #[tokio::test]
    async fn not_found_carries_the_payload() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/orders/missing");
            then.status(404)
                .json_body(fixtures::not_found_json("Order not found"));
        });

        let result = facade_for(&server, None)?
            .orders()
            .get_order("missing")
            .await;

        match result {
            Err(ClientError::NotFound {
                operation,
                details: Some(details),
                body,
            }) => {
                assert!(body.contains("Order not found"));
                assert_eq!(operation, "orders:get_order");
                assert_eq!(details.detail, "Order not found");
            }
            other => panic!("expected not found, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn validation_errors_expose_field_paths() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/orders/");
            then.status(422).json_body(fixtures::validation_error_json(&[(
                "query.limit",
                "Input should be less than or equal to 100",
            )]));
        });

        let result = facade_for(&server, None)?
            .orders()
            .list_orders(ListOrdersRequest::default().paginate(1, 1000))
            .await;

        match result {
            Err(ClientError::Validation { details, .. }) => {
                assert_eq!(details.fields(), vec!["query.limit".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_keep_status_and_body() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/orders/statistics");
            then.status(500).body("boom");
        });

        let result = facade_for(&server, None)?
            .orders()
            .get_orders_statistics(OrdersStatisticsRequest::default())
            .await;

        assert!(matches!(
            result,
            Err(ClientError::OtherHttp { status: 500, ref body, .. }) if body == "boom"
        ));
        Ok(())
    }
}
