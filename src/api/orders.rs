// Order endpoints

use super::{with_page, ORDERS_PATH};
use crate::error::ApiError;
use crate::http_client::AuthClient;
use crate::models::{CreateOrderRequest, GenericResponse, Order, Page, PageRequest, PlacedOrder};
use crate::request::RequestDescriptor;

/// List orders (`pageNumber` / `pageSize`)
pub async fn list_orders(client: &AuthClient, page: PageRequest) -> Result<Page<Order>, ApiError> {
    let descriptor = with_page(
        RequestDescriptor::get(ORDERS_PATH),
        page,
        "pageNumber",
        "pageSize",
    );
    let response: GenericResponse<Page<Order>> = client.send(descriptor).await?.json()?;
    Ok(response.data)
}

/// Place an order. The backend echoes the stored order in `data`.
pub async fn create_order(
    client: &AuthClient,
    order: &CreateOrderRequest,
) -> Result<PlacedOrder, ApiError> {
    let response: GenericResponse<PlacedOrder> = client.post(ORDERS_PATH, order).await?;
    Ok(response.data)
}
