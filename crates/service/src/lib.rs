//! Service layer: the ShelfUp business rules on top of `models`.
//! - Free functions take a connection and the acting user's id.
//! - Authorization by location lives in `access`; role gates stay in the HTTP layer.
//! - Errors are `ServiceError`, except auth which has its own `AuthError`.

pub mod errors;
pub mod auth;
pub mod pagination;
pub mod settings;
pub mod access;
pub mod contracts;
pub mod companies;
pub mod distributor_products;
pub mod qr_image;
pub mod qr_codes;
pub mod storefront;
pub mod manufacturer;
pub mod admin;
pub mod settlements;
pub mod reviews;
pub mod sample_orders;
#[cfg(test)]
pub mod test_support;
