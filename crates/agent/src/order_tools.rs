//! The ten order-management tools offered to the model.
//!
//! Each tool maps its arguments onto exactly one order API call and returns
//! the response body unchanged.

use async_trait::async_trait;
use ordercopilot_core::{AmountLine, Loan, NewOrder, OrderId, Party, Service};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::orders::{OrderLine, OrdersApi};
use crate::tools::{parse_arguments, Tool, ToolError, ToolRegistry};

pub const ORDER_TOOL_NAMES: [&str; 10] = [
    "create_order",
    "get_order",
    "get_all_orders",
    "add_or_update_service",
    "add_or_update_party",
    "add_or_update_charge",
    "add_or_update_deposit",
    "add_or_update_loan",
    "add_or_update_fee",
    "delete_order",
];

pub fn order_tool_registry(api: OrdersApi) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(CreateOrderTool { api: api.clone() });
    registry.register(GetOrderTool { api: api.clone() });
    registry.register(GetAllOrdersTool { api: api.clone() });
    registry.register(ServiceTool { api: api.clone() });
    registry.register(PartyTool { api: api.clone() });
    registry.register(AmountLineTool::charge(api.clone()));
    registry.register(AmountLineTool::deposit(api.clone()));
    registry.register(LoanTool { api: api.clone() });
    registry.register(AmountLineTool::fee(api.clone()));
    registry.register(DeleteOrderTool { api });
    registry
}

#[derive(Deserialize)]
struct IdArgs {
    #[serde(deserialize_with = "order_id")]
    id: i64,
}

#[derive(Deserialize)]
struct ServiceArgs {
    #[serde(deserialize_with = "order_id")]
    id: i64,
    #[serde(rename = "type")]
    service_type: String,
}

#[derive(Deserialize)]
struct PartyArgs {
    #[serde(deserialize_with = "order_id")]
    id: i64,
    #[serde(rename = "partyType", alias = "party_type")]
    party_type: String,
    name: String,
}

#[derive(Deserialize)]
struct AmountLineArgs {
    #[serde(deserialize_with = "order_id")]
    id: i64,
    description: String,
    amount: Decimal,
}

#[derive(Deserialize)]
struct LoanArgs {
    #[serde(deserialize_with = "order_id")]
    id: i64,
    lender: String,
    amount: Decimal,
}

/// Models sometimes quote numbers; `"5000"` is accepted as order 5000.
fn order_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(raw) => raw
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("order id `{raw}` is not an integer"))),
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({"type": "object", "properties": properties, "required": required})
}

fn order_id_property() -> Value {
    json!({"type": "integer", "description": "Order ID"})
}

pub struct CreateOrderTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for CreateOrderTool {
    fn name(&self) -> &'static str {
        "create_order"
    }

    fn description(&self) -> &'static str {
        "Create a new order. Organization and transactionType are required. Others are optional lists."
    }

    fn parameters(&self) -> Value {
        let list = json!({"type": "array", "items": {"type": "object"}});
        object_schema(
            json!({
                "organization": {"type": "string"},
                "transactionType": {
                    "type": "string",
                    "description": "e.g. Sale with Mortgage, Refinance, Sale with Cash"
                },
                "parties": list,
                "services": list,
                "charges": list,
                "deposits": list,
                "loans": list,
                "fees": list
            }),
            &["organization", "transactionType"],
        )
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let order: NewOrder = parse_arguments(self.name(), input)?;
        Ok(self.api.create_order(&order).await?)
    }
}

pub struct GetOrderTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for GetOrderTool {
    fn name(&self) -> &'static str {
        "get_order"
    }

    fn description(&self) -> &'static str {
        "Get an order by ID."
    }

    fn parameters(&self) -> Value {
        object_schema(json!({"id": order_id_property()}), &["id"])
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: IdArgs = parse_arguments(self.name(), input)?;
        Ok(self.api.get_order(OrderId(args.id)).await?)
    }
}

pub struct GetAllOrdersTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for GetAllOrdersTool {
    fn name(&self) -> &'static str {
        "get_all_orders"
    }

    fn description(&self) -> &'static str {
        "Retrieve all orders."
    }

    fn parameters(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn execute(&self, _input: Value) -> Result<Value, ToolError> {
        Ok(self.api.list_orders().await?)
    }
}

pub struct ServiceTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for ServiceTool {
    fn name(&self) -> &'static str {
        "add_or_update_service"
    }

    fn description(&self) -> &'static str {
        "Add or update a service for an order. Type is required (e.g., Escrow/Title/Both)."
    }

    fn parameters(&self) -> Value {
        object_schema(
            json!({
                "id": order_id_property(),
                "type": {"type": "string", "description": "Escrow, Title or Both"}
            }),
            &["id", "type"],
        )
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: ServiceArgs = parse_arguments(self.name(), input)?;
        let body = Service { service_type: args.service_type };
        Ok(self.api.put_line(OrderId(args.id), OrderLine::Services, &body).await?)
    }
}

pub struct PartyTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for PartyTool {
    fn name(&self) -> &'static str {
        "add_or_update_party"
    }

    fn description(&self) -> &'static str {
        "Add or update a party for an order. partyType (buyer/seller/lender/attorney) and name required."
    }

    fn parameters(&self) -> Value {
        object_schema(
            json!({
                "id": order_id_property(),
                "partyType": {"type": "string", "description": "buyer, seller, lender or attorney"},
                "name": {"type": "string"}
            }),
            &["id", "partyType", "name"],
        )
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: PartyArgs = parse_arguments(self.name(), input)?;
        let body = Party { party_type: args.party_type, name: args.name };
        Ok(self.api.put_party(OrderId(args.id), &body.party_type, &body).await?)
    }
}

/// Charges, deposits and fees share a `{description, amount}` body.
pub struct AmountLineTool {
    api: OrdersApi,
    name: &'static str,
    description: &'static str,
    line: OrderLine,
}

impl AmountLineTool {
    pub fn charge(api: OrdersApi) -> Self {
        Self {
            api,
            name: "add_or_update_charge",
            description: "Add or update a charge for an order. Description and amount required.",
            line: OrderLine::Charges,
        }
    }

    pub fn deposit(api: OrdersApi) -> Self {
        Self {
            api,
            name: "add_or_update_deposit",
            description: "Add or update a deposit for an order. Description and amount required.",
            line: OrderLine::Deposits,
        }
    }

    pub fn fee(api: OrdersApi) -> Self {
        Self {
            api,
            name: "add_or_update_fee",
            description: "Add or update a fee for an order. Description and amount required.",
            line: OrderLine::Fees,
        }
    }
}

#[async_trait]
impl Tool for AmountLineTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn parameters(&self) -> Value {
        object_schema(
            json!({
                "id": order_id_property(),
                "description": {"type": "string"},
                "amount": {"type": "number"}
            }),
            &["id", "description", "amount"],
        )
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: AmountLineArgs = parse_arguments(self.name, input)?;
        let body = AmountLine { description: args.description, amount: args.amount };
        Ok(self.api.put_line(OrderId(args.id), self.line, &body).await?)
    }
}

pub struct LoanTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for LoanTool {
    fn name(&self) -> &'static str {
        "add_or_update_loan"
    }

    fn description(&self) -> &'static str {
        "Add or update a loan for an order. Lender and amount required."
    }

    fn parameters(&self) -> Value {
        object_schema(
            json!({
                "id": order_id_property(),
                "lender": {"type": "string"},
                "amount": {"type": "number"}
            }),
            &["id", "lender", "amount"],
        )
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: LoanArgs = parse_arguments(self.name(), input)?;
        let body = Loan { lender: args.lender, amount: args.amount };
        Ok(self.api.put_line(OrderId(args.id), OrderLine::Loans, &body).await?)
    }
}

pub struct DeleteOrderTool {
    api: OrdersApi,
}

#[async_trait]
impl Tool for DeleteOrderTool {
    fn name(&self) -> &'static str {
        "delete_order"
    }

    fn description(&self) -> &'static str {
        "Delete an order by ID."
    }

    fn parameters(&self) -> Value {
        object_schema(json!({"id": order_id_property()}), &["id"])
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let args: IdArgs = parse_arguments(self.name(), input)?;
        Ok(self.api.delete_order(OrderId(args.id)).await?)
    }
}
