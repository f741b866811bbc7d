pub mod auth;
pub mod basket;
pub mod catalog;
pub mod common;
pub mod contacts;
pub mod orders;
pub mod products;
