pub mod formatter;
pub mod models;
pub mod payload;
pub mod senders;
pub mod service;
