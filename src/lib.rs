#[macro_use]
extern crate diesel;

pub mod access;
pub mod aggregator;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod stats;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;
