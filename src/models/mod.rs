// Data models for the storefront backend

pub mod auth;
pub mod order;
pub mod product;

use serde::{Deserialize, Serialize};

pub use auth::{RefreshRequest, RefreshedTokens, SignInData, SignInRequest, UserProfile};
pub use order::{CreateOrderRequest, Order, OrderItem, OrderStatus, PlacedOrder};
pub use product::{CreateProductRequest, EditProductRequest, Product};

// ==================================================================================================
// Envelopes
// ==================================================================================================

/// Standard success wrapper: `{ "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenericResponse<T> {
    pub data: T,
}

/// Backend error body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<u16>,
}

/// Payload that may arrive bare or wrapped in `{ "data": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeWrapped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> MaybeWrapped<T> {
    pub fn into_inner(self) -> T {
        match self {
            MaybeWrapped::Wrapped { data } => data,
            MaybeWrapped::Bare(value) => value,
        }
    }
}

// ==================================================================================================
// Pagination
// ==================================================================================================

/// One page of a paginated listing (zero-based page index)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
    pub size: u32,
    pub number_of_elements: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<bool>,
}

impl<T> Page<T> {
    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        match self.last {
            Some(last) => !last,
            None => self.number.saturating_add(1) < self.total_pages,
        }
    }
}

/// Requested page; unset fields are left to the backend's defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }
}
