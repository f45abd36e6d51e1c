pub mod bridge;
pub mod chapter;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod stop;
pub mod store;
