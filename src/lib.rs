//! src/lib.rs
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod mail_encoding;
pub mod registration;
pub mod routes;
pub mod startup;
pub mod telemetry;
