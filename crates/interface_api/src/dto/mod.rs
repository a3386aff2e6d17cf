//! Request and response bodies

pub mod account;
pub mod auth;
pub mod invoice;
