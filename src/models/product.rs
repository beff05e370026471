// Product catalog payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
}

/// Partial update; the backend applies it with PATCH
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditProductRequest {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub stock: i64,
}
