// Product catalog endpoints

use super::{with_page, PRODUCTS_PATH};
use crate::error::ApiError;
use crate::http_client::AuthClient;
use crate::models::{
    CreateProductRequest, EditProductRequest, GenericResponse, Page, PageRequest, Product,
};
use crate::request::RequestDescriptor;

fn product_path(id: &str) -> String {
    format!("{}/{}", PRODUCTS_PATH, id)
}

/// List products (`pageNo` / `pageSz`)
pub async fn list_products(client: &AuthClient, page: PageRequest) -> Result<Page<Product>, ApiError> {
    let descriptor = with_page(RequestDescriptor::get(PRODUCTS_PATH), page, "pageNo", "pageSz");
    let response: GenericResponse<Page<Product>> = client.send(descriptor).await?.json()?;
    Ok(response.data)
}

pub async fn create_product(
    client: &AuthClient,
    product: &CreateProductRequest,
) -> Result<Product, ApiError> {
    let response: GenericResponse<Product> = client.post(PRODUCTS_PATH, product).await?;
    Ok(response.data)
}

pub async fn update_product(
    client: &AuthClient,
    id: &str,
    product: &EditProductRequest,
) -> Result<Product, ApiError> {
    let response: GenericResponse<Product> = client.patch(&product_path(id), product).await?;
    Ok(response.data)
}

/// Delete a product; the response body is ignored
pub async fn delete_product(client: &AuthClient, id: &str) -> Result<(), ApiError> {
    client
        .send(RequestDescriptor::delete(product_path(id)))
        .await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}
