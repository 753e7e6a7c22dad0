use std::time::Duration;

use ordercopilot_core::config::OrdersConfig;
use ordercopilot_core::{NewOrder, OrderId};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OrderApiError {
    #[error("order api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("order api returned HTTP {status} with a non-JSON body: {body:?}")]
    UnexpectedBody { status: u16, body: String },
}

/// Order sub-collections addressable with `PUT /orders/{id}/<segment>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderLine {
    Services,
    Charges,
    Deposits,
    Loans,
    Fees,
}

impl OrderLine {
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Charges => "charges",
            Self::Deposits => "deposits",
            Self::Loans => "loans",
            Self::Fees => "fees",
        }
    }
}

/// Thin HTTP client over the order-management REST API. JSON response bodies
/// are returned verbatim, whatever the status.
#[derive(Clone)]
pub struct OrdersApi {
    client: Client,
    orders_url: String,
}

impl OrdersApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OrderApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &OrdersConfig) -> Result<Self, OrderApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self { client, orders_url: format!("{}/orders", base_url.trim().trim_end_matches('/')) }
    }

    pub fn orders_url(&self) -> &str {
        &self.orders_url
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Value, OrderApiError> {
        self.send(Method::POST, self.orders_url.clone(), Some(order)).await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Value, OrderApiError> {
        self.send::<()>(Method::GET, format!("{}/{id}", self.orders_url), None).await
    }

    pub async fn list_orders(&self) -> Result<Value, OrderApiError> {
        self.send::<()>(Method::GET, self.orders_url.clone(), None).await
    }

    pub async fn put_line<B>(
        &self,
        id: OrderId,
        line: OrderLine,
        body: &B,
    ) -> Result<Value, OrderApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{id}/{}", self.orders_url, line.segment());
        self.send(Method::PUT, url, Some(body)).await
    }

    pub async fn put_party<B>(
        &self,
        id: OrderId,
        party_type: &str,
        body: &B,
    ) -> Result<Value, OrderApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{id}/parties/{party_type}", self.orders_url);
        self.send(Method::PUT, url, Some(body)).await
    }

    /// 204 maps to `{"success": true}`; anything else to
    /// `{"success": false, "error": <body>}`.
    pub async fn delete_order(&self, id: OrderId) -> Result<Value, OrderApiError> {
        let url = format!("{}/{id}", self.orders_url);
        debug!(event_name = "orders.request", method = "DELETE", url = %url, "calling order api");
        let response = self.client.delete(&url).send().await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(json!({"success": true}));
        }
        let body = response.text().await?;
        Ok(json!({"success": false, "error": body}))
    }

    /// Reachability probe used by health and doctor checks.
    pub async fn probe(&self) -> Result<StatusCode, OrderApiError> {
        Ok(self.client.get(&self.orders_url).send().await?.status())
    }

    async fn send<B>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> Result<Value, OrderApiError>
    where
        B: Serialize + ?Sized,
    {
        debug!(event_name = "orders.request", method = %method, url = %url, "calling order api");
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(
            event_name = "orders.response",
            status = status.as_u16(),
            url = %url,
            "order api responded"
        );

        json_body(status, text)
    }
}

/// Empty and non-JSON bodies are failures; plain-text validation messages
/// from the order API land here.
fn json_body(status: StatusCode, text: String) -> Result<Value, OrderApiError> {
    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(_) => Err(OrderApiError::UnexpectedBody { status: status.as_u16(), body: text }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ordercopilot_core::{NewOrder, OrderId};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{json_body, OrderApiError, OrderLine, OrdersApi};

    fn api(server: &MockServer) -> OrdersApi {
        OrdersApi::new(&server.uri(), Duration::from_secs(5)).expect("client should build")
    }

    #[tokio::test]
    async fn create_order_posts_required_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_json(json!({"organization": "Acme Title", "transactionType": "Refinance"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 5000,
                "organization": "Acme Title",
                "transactionType": "Refinance"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let order = NewOrder {
            organization: "Acme Title".to_string(),
            transaction_type: "Refinance".to_string(),
            parties: None,
            services: None,
            charges: None,
            deposits: None,
            loans: None,
            fees: None,
        };
        let created = api(&server).create_order(&order).await.expect("create should succeed");

        assert_eq!(created["id"], 5000);
    }

    #[tokio::test]
    async fn delete_maps_no_content_to_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orders/5000"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = api(&server).delete_order(OrderId(5000)).await.expect("delete should return");
        assert_eq!(result, json!({"success": true}));
    }

    #[tokio::test]
    async fn delete_maps_other_status_to_failure_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/orders/42"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let result = api(&server).delete_order(OrderId(42)).await.expect("delete should return");
        assert_eq!(result, json!({"success": false, "error": "Not Found"}));
    }

    #[tokio::test]
    async fn put_line_targets_collection_segment() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/orders/5000/loans"))
            .and(body_json(json!({"lender": "First Bank", "amount": 250000.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5000})))
            .expect(1)
            .mount(&server)
            .await;

        let result = api(&server)
            .put_line(
                OrderId(5000),
                OrderLine::Loans,
                &json!({"lender": "First Bank", "amount": 250000.0}),
            )
            .await
            .expect("put should succeed");
        assert_eq!(result["id"], 5000);
    }

    #[tokio::test]
    async fn json_error_body_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders/7"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"title": "Not Found", "status": 404})),
            )
            .mount(&server)
            .await;

        let result = api(&server).get_order(OrderId(7)).await.expect("get should return");
        assert_eq!(result["status"], 404);
    }

    #[tokio::test]
    async fn plain_text_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("Organization and TransactionType are required."),
            )
            .mount(&server)
            .await;

        let order = NewOrder {
            organization: String::new(),
            transaction_type: String::new(),
            parties: None,
            services: None,
            charges: None,
            deposits: None,
            loans: None,
            fees: None,
        };
        let result = api(&server).create_order(&order).await;

        match result {
            Err(OrderApiError::UnexpectedBody { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "Organization and TransactionType are required.");
            }
            other => panic!("expected unexpected-body error, got {other:?}"),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = OrdersApi::with_client(reqwest::Client::new(), "http://localhost:5000/");
        assert_eq!(api.orders_url(), "http://localhost:5000/orders");
    }

    #[test]
    fn empty_body_is_rejected() {
        let empty = json_body(reqwest::StatusCode::OK, "  ".to_string());
        assert!(matches!(empty, Err(OrderApiError::UnexpectedBody { status: 200, .. })));

        let list = json_body(reqwest::StatusCode::OK, "[1,2]".to_string());
        assert_eq!(list.ok(), Some(json!([1, 2])));
    }
}
