//! Database query modules for feria-web

pub mod listings;
