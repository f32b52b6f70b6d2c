pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod company;
pub mod distributor;
pub mod manufacturer;
pub mod product;
pub mod order;
pub mod order_item;
pub mod distributor_product;
pub mod qr_code;
pub mod qr_code_product;
pub mod sale;
pub mod settlement;
pub mod review;
pub mod sample_order;
pub mod system_setting;

#[cfg(test)]
mod tests;
