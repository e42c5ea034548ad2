//! Admin dashboard and LINE restriction widget for the AI Collections
//! platform.
//!
//! The dashboard renders platform statistics, the company list, three trend
//! charts and an activity feed into a server-side page document, refreshed
//! periodically from the admin REST API. The widget checks a LINE user's
//! restriction status for a product page and overlays a call to action.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod diagnostics;
pub mod dom;
pub mod session;
pub mod utils;
pub mod web;
pub mod widget;
