pub mod csv_batch;
pub mod error;
pub mod features;
pub mod insight;
pub mod models;
pub mod orchestrator;
pub mod predictor;
pub mod schema;
pub mod server;
pub mod validate;
