//! Request handlers, one module per resource

pub mod health;
pub mod auth;
pub mod reference;
pub mod account;
pub mod invoices;
