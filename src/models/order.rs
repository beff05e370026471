// Order payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub items: Vec<OrderItem>,
}

/// Order as echoed back by the create endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: String,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_status_wire_format() {
        let order: Order = serde_json::from_value(json!({
            "id": "o-1",
            "customerName": "Ana",
            "status": "COMPLETED",
            "totalPrice": 19.5,
            "createdAt": "2025-01-12T10:30:00Z"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        let body = serde_json::to_value(CreateOrderRequest {
            customer_name: "Ana".to_string(),
            items: vec![OrderItem {
                product_id: "p-1".to_string(),
                quantity: 2,
            }],
        })
        .unwrap();
        assert_eq!(body["items"][0]["productId"], "p-1");
    }
}
