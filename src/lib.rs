//! Terminal client for a query-catalog analytics backend.
//!
//! Discovers the backend's named queries, binds date-range parameters,
//! and renders each result as a capped grid plus a best-effort line chart.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod health;
pub mod history;
pub mod params;
pub mod render;
pub mod runner;
