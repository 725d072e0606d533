pub mod api;
pub mod registry;
pub mod server;
pub mod stream;
