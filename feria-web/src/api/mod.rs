//! HTTP API handlers for feria-web

pub mod health;
pub mod import;
pub mod leads;
