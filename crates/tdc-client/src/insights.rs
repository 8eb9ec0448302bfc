//! # Dashboard, Analytics & Reports
//!
//! Read-only views served by the same backend as the query service. Their
//! bodies are passed through as JSON; only report generation has local
//! behavior (parameter selection and writing the report to disk).

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use crate::http::ApiClient;
use crate::slot::{Outcome, RequestSlot};
use crate::ClientError;

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Overview,
    RecentActivity { limit: u32 },
    TopPerformers,
    Alerts,
    QuickStats,
}

impl DashboardView {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Overview => "/dashboard/overview",
            Self::RecentActivity { .. } => "/dashboard/recent-activity",
            Self::TopPerformers => "/dashboard/top-performers",
            Self::Alerts => "/dashboard/alerts",
            Self::QuickStats => "/dashboard/quick-stats",
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::RecentActivity { limit } => vec![("limit", limit.to_string())],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsView {
    Dashboard,
    Clients,
    Findings,
    Performance,
}

impl AnalyticsView {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Dashboard => "/analytics/dashboard",
            Self::Clients => "/analytics/clients",
            Self::Findings => "/analytics/findings",
            Self::Performance => "/analytics/performance",
        }
    }
}

/// Parameters for `/reports/{type}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub report_type: String,
    pub start_date: String,
    pub end_date: String,
    /// Only sent for `client` reports.
    pub client_id: String,
    /// Only sent for `agency` reports.
    pub agency: String,
}

impl ReportRequest {
    pub fn new(report_type: impl Into<String>) -> Self {
        Self {
            report_type: report_type.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> Result<String, ClientError> {
        if self.report_type.is_empty() {
            return Err(ClientError::MissingReportType);
        }
        Ok(format!("/reports/{}", self.report_type))
    }

    /// Query parameters; empty values are left out.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.start_date.is_empty() {
            params.push(("startDate", self.start_date.clone()));
        }
        if !self.end_date.is_empty() {
            params.push(("endDate", self.end_date.clone()));
        }
        match self.report_type.as_str() {
            "client" if !self.client_id.is_empty() => {
                params.push(("clientId", self.client_id.clone()));
            }
            "agency" if !self.agency.is_empty() => {
                params.push(("agency", self.agency.clone()));
            }
            _ => {}
        }
        params
    }
}

#[derive(Debug)]
pub struct InsightsClient {
    api: ApiClient,
    report_slot: RequestSlot,
}

impl InsightsClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            report_slot: RequestSlot::new("report"),
        }
    }

    pub async fn dashboard(&self, view: DashboardView) -> Result<Value, ClientError> {
        self.api.get_json(view.path(), &view.params()).await
    }

    pub async fn analytics(&self, view: AnalyticsView) -> Result<Value, ClientError> {
        self.api.get_json(view.path(), &[]).await
    }

    pub async fn report_templates(&self) -> Result<Value, ClientError> {
        self.api.get_json("/reports/templates", &[]).await
    }

    /// The `clients` array of `/clients`.
    pub async fn clients(&self) -> Result<Vec<Value>, ClientError> {
        let body: Value = self.api.get_json("/clients", &[]).await?;
        Ok(client_list(&body).to_vec())
    }

    pub async fn agencies(&self) -> Result<Vec<String>, ClientError> {
        let body: Value = self.api.get_json("/clients", &[]).await?;
        Ok(agencies(client_list(&body)))
    }

    /// Fetch a report. A response that arrives after a newer report was
    /// requested is dropped.
    pub async fn generate_report(
        &self,
        request: &ReportRequest,
    ) -> Result<Outcome<Value>, ClientError> {
        let path = request.path()?;
        let ticket = self.report_slot.issue();
        let request_id = Uuid::new_v4();
        tracing::info!(
            %request_id,
            slot = ticket.slot,
            ticket = ticket.seq,
            report_type = %request.report_type,
            "generating report"
        );
        let started = Instant::now();
        let result = self.api.get_json(&path, &request.params()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !self.report_slot.is_current(ticket) {
            tracing::warn!(%request_id, ticket = ticket.seq, elapsed_ms, "dropping stale report");
            return Ok(Outcome::Superseded);
        }
        match result {
            Ok(report) => {
                tracing::info!(%request_id, elapsed_ms, "report ready");
                Ok(Outcome::Applied(report))
            }
            Err(e) => {
                tracing::error!(%request_id, elapsed_ms, "report failed: {}", e);
                Err(e)
            }
        }
    }
}

fn client_list(body: &Value) -> &[Value] {
    body.get("clients")
        .or(Some(body))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Distinct `agency` values in first-seen order. Clients without one are
/// skipped.
pub fn agencies(clients: &[Value]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for agency in clients.iter().filter_map(|c| c.get("agency")?.as_str()) {
        if !agency.is_empty() && !seen.iter().any(|a| a == agency) {
            seen.push(agency.to_string());
        }
    }
    seen
}

pub fn report_file_name(report_type: &str, date: NaiveDate) -> String {
    format!("{}-{}.json", report_type, date.format("%Y-%m-%d"))
}

/// Write `report` as pretty JSON into `dir`, creating it if needed.
pub fn save_report(
    dir: &Path,
    report_type: &str,
    report: &Value,
    date: NaiveDate,
) -> Result<PathBuf, ClientError> {
    std::fs::create_dir_all(dir).map_err(|source| ClientError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(report_file_name(report_type, date));
    let body = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, body).map_err(|source| ClientError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!("report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_id_only_for_client_reports() {
        let mut request = ReportRequest {
            report_type: "client".into(),
            client_id: "c1".into(),
            agency: "Northwind".into(),
            ..ReportRequest::default()
        };
        assert_eq!(request.params(), vec![("clientId", "c1".to_string())]);

        request.report_type = "agency".into();
        assert_eq!(request.params(), vec![("agency", "Northwind".to_string())]);

        request.report_type = "summary".into();
        assert!(request.params().is_empty());
    }

    #[test]
    fn test_dates_only_when_set() {
        let request = ReportRequest {
            report_type: "summary".into(),
            start_date: "2024-01-01".into(),
            ..ReportRequest::default()
        };
        assert_eq!(request.params(), vec![("startDate", "2024-01-01".to_string())]);
        assert_eq!(request.path().unwrap(), "/reports/summary");
    }

    #[test]
    fn test_missing_report_type() {
        let err = ReportRequest::default().path().unwrap_err();
        assert_eq!(
            err.user_message("Failed to generate report"),
            "Please select a report type"
        );
    }

    #[test]
    fn test_recent_activity_limit_param() {
        let view = DashboardView::RecentActivity { limit: 25 };
        assert_eq!(view.path(), "/dashboard/recent-activity");
        assert_eq!(view.params(), vec![("limit", "25".to_string())]);
        assert!(DashboardView::Alerts.params().is_empty());
    }

    #[test]
    fn test_agencies_first_seen_order() {
        let body = json!({"clients": [
            {"client_name": "A", "agency": "Northwind"},
            {"client_name": "B", "agency": "Contoso"},
            {"client_name": "C", "agency": "Northwind"},
            {"client_name": "D"},
        ]});
        assert_eq!(agencies(client_list(&body)), vec!["Northwind", "Contoso"]);
        assert!(client_list(&json!({"total": 0})).is_empty());
    }

    #[test]
    fn test_save_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let report = json!({"summary": {"total": 3}});

        let path = save_report(&out, "summary", &report, date).unwrap();
        assert_eq!(path, out.join("summary-2024-03-09.json"));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }
}
