//! Request bodies for the external order-management API.
//!
//! Orders themselves stay opaque: responses are passed through as JSON. These
//! types only shape what we send.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned by the order API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /orders`. Optional collections are omitted when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub organization: String,
    #[serde(alias = "transaction_type")]
    pub transaction_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parties: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charges: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposits: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loans: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Vec<Value>>,
}

/// Buyer, seller, lender or attorney.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "type")]
    pub party_type: String,
    pub name: String,
}

/// Escrow, Title or Both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "type")]
    pub service_type: String,
}

/// Shared shape of charges, deposits and fees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmountLine {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub lender: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{AmountLine, NewOrder, Party};

    #[test]
    fn new_order_omits_absent_collections() {
        let order = NewOrder {
            organization: "Acme Title".to_string(),
            transaction_type: "Sale with Mortgage".to_string(),
            parties: None,
            services: Some(vec![json!({"type": "Escrow"})]),
            charges: None,
            deposits: None,
            loans: None,
            fees: None,
        };

        let value = serde_json::to_value(&order).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "organization": "Acme Title",
                "transactionType": "Sale with Mortgage",
                "services": [{"type": "Escrow"}]
            })
        );
    }

    #[test]
    fn new_order_accepts_snake_case_transaction_type() {
        let order: Result<NewOrder, _> = serde_json::from_value(json!({
            "organization": "Acme Title",
            "transaction_type": "Refinance"
        }));

        assert_eq!(order.map(|order| order.transaction_type).ok(), Some("Refinance".to_string()));
    }

    #[test]
    fn amounts_are_sent_as_json_numbers() {
        let line = AmountLine { description: "Recording fee".to_string(), amount: Decimal::new(12550, 2) };

        assert_eq!(
            serde_json::to_value(&line).unwrap_or_default(),
            json!({"description": "Recording fee", "amount": 125.5})
        );
    }

    #[test]
    fn party_serializes_type_field() {
        let party = Party { party_type: "buyer".to_string(), name: "Jane Doe".to_string() };

        assert_eq!(
            serde_json::to_value(&party).unwrap_or_default(),
            json!({"type": "buyer", "name": "Jane Doe"})
        );
    }
}
