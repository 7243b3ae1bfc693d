//! Adjust.com API client library.
//!
//! Provides a typed, blocking client for the Adjust dashboard and KPI service
//! APIs: apps, raw export settings, callbacks, and KPI/event/cohort reports.
//! KPI result sets are dynamically shaped; [`shape`] discovers their grouping
//! and flattens them into rows.
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the application.

pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod kpi;
pub mod model;
pub mod parse;
pub mod secret;
pub mod shape;
pub mod transport;

pub use client::Client;
pub use config::Config;
pub use error::{ArgumentError, Error, HttpError, ValidationError, ValidationErrorKind};
pub use helpers::{get_user_token, TokenSource};
pub use kpi::{KpiQuery, KpiService, Report};
pub use model::{App, Currency, KpiResult, Permissions, ResultParameters};
pub use parse::{parse_apps, parse_kpi};
pub use shape::{flatten_result_set, infer_grouping, infer_meta_paths};
pub use transport::{HttpResponse, ReqwestTransport, Transport};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
