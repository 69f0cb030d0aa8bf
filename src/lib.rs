//! # Comunica Hub Library
//!
//! This library provides the core functionality for the Comunica Hub
//! service: fetching judicial publications from the upstream source,
//! normalizing and storing them, deriving notifications, and serving the
//! HTTP API.

pub mod aggregator;
pub mod comunica;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod normalization;
pub mod notifier;
pub mod repositories;
pub mod search;
pub mod server;
pub use migration;
