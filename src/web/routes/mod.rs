pub mod directory_routes;
pub mod notify_routes;
