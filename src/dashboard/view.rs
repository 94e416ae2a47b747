//! JSON view model rendered by the dashboard page.

use serde::Serialize;

use crate::constants::REPORT_FILE_NAME;
use crate::error::{AnalysisError, ErrorKind};
use crate::output;
use crate::report::AnalysisReport;
use crate::{Analysis, Outcome};

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Download {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisView {
    Detected {
        message: String,
        headline: Vec<Metric>,
        details: Vec<Metric>,
        report: AnalysisReport,
        download: Download,
    },
    Empty {
        message: String,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl AnalysisView {
    pub fn error(message: impl Into<String>, detail: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            detail,
        }
    }
}

/// Maps an analysis attempt to an HTTP status and the view the page renders.
pub fn render(result: Result<Analysis, AnalysisError>) -> (u16, AnalysisView) {
    match result {
        Ok(analysis) => match analysis.outcome {
            Outcome::Detected(report) => render_report(report),
            Outcome::NoDetections => (
                200,
                AnalysisView::Empty {
                    message: "❌ No flowers detected".to_string(),
                },
            ),
        },
        Err(err) => render_error(&err),
    }
}

fn render_report(report: AnalysisReport) -> (u16, AnalysisView) {
    let content = match output::report_json(&report) {
        Ok(content) => content,
        Err(err) => {
            log::error!("failed to serialize report: {err}");
            return (500, AnalysisView::error("❌ Failed to build report", None));
        }
    };

    let headline = vec![
        Metric {
            label: "🌸 Flowers",
            value: report.flower_count.to_string(),
        },
        Metric {
            label: "📐 Avg Size",
            value: px(report.average_area),
        },
        Metric {
            label: "📈 Coverage",
            value: format!("{:.1}%", report.coverage_percent),
        },
    ];
    let details = vec![
        Metric {
            label: "Min",
            value: px(report.min_area),
        },
        Metric {
            label: "Max",
            value: px(report.max_area),
        },
        Metric {
            label: "Avg",
            value: px(report.average_area),
        },
        Metric {
            label: "Total",
            value: px(report.total_area),
        },
    ];

    (
        200,
        AnalysisView::Detected {
            message: "✅ Analysis complete!".to_string(),
            headline,
            details,
            report,
            download: Download {
                file_name: REPORT_FILE_NAME,
                mime: "application/json",
                content,
            },
        },
    )
}

fn render_error(err: &AnalysisError) -> (u16, AnalysisView) {
    match err {
        AnalysisError::Upstream { status, body } => (
            502,
            AnalysisView::error(format!("❌ Error: {status}"), Some(body.clone())),
        ),
        _ if err.is_timeout() => (
            504,
            AnalysisView::error("❌ Detection API timed out", Some(err.to_string())),
        ),
        _ => {
            let status = match err.kind() {
                ErrorKind::Input => 422,
                ErrorKind::Upstream => 502,
                ErrorKind::Configuration => 500,
            };
            (status, AnalysisView::error(format!("❌ {err}"), None))
        }
    }
}

fn px(area: f64) -> String {
    format!("{area:.0} px²")
}
