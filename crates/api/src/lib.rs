pub mod auth;
pub mod error;
pub mod health;
pub mod report;
pub mod routes;
pub mod service;
pub mod state;
