pub mod api;
pub mod cache;
pub mod error;
pub mod listing;
pub mod query;
pub mod redis;
pub mod responder;
pub mod store;
pub mod whatsapp;
