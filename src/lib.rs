pub mod notifications;
pub mod registry;
pub mod server;
pub mod version;
pub mod web;
