// Configuration, logging and shutdown
pub mod config;
pub mod shutdown;
pub mod telemetry;

// HTTP Server modules
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validation;

// Domain operations over the store
pub mod operations;

// Document/graph store client
pub mod store;

// Chat-completion layer and the service built on it
pub mod legacy;
pub mod llm;
