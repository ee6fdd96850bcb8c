pub mod config;
pub mod error;
pub mod fetch;
pub mod flow;
pub mod logging;
pub mod server;
pub mod view;
