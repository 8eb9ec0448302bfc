//! # tdc-client: talking to the takedowns backend
//!
//! [`QuerySession`] drives both query forms against a [`QueryService`];
//! [`InsightsClient`] covers the dashboard, analytics and report views.

pub mod config;
pub mod error;
pub mod http;
pub mod insights;
pub mod service;
pub mod session;
pub mod slot;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::ApiClient;
pub use insights::{
    agencies, save_report, AnalyticsView, DashboardView, InsightsClient, ReportRequest,
};
pub use service::{HttpQueryService, QueryService};
pub use session::QuerySession;
pub use slot::{Outcome, RequestSlot, Ticket};
