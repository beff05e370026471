// Typed wrappers for the storefront backend endpoints

pub mod auth;
pub mod orders;
pub mod products;

use crate::models::PageRequest;
use crate::request::RequestDescriptor;

pub const SIGN_IN_PATH: &str = "/user/auth/sign-in";
pub const SIGN_UP_PATH: &str = "/user/auth/sign-up";
pub const PROFILE_PATH: &str = "/user/user/me";
pub const PRODUCTS_PATH: &str = "/product/products";
pub const ORDERS_PATH: &str = "/order/orders";

/// Append pagination parameters under the names a resource expects
fn with_page(
    mut descriptor: RequestDescriptor,
    page: PageRequest,
    page_key: &str,
    size_key: &str,
) -> RequestDescriptor {
    if let Some(number) = page.page {
        descriptor = descriptor.with_query(page_key, number);
    }
    if let Some(size) = page.size {
        descriptor = descriptor.with_query(size_key, size);
    }
    descriptor
}
