//! Table formatting for command output.

use tabled::settings::{object::Rows, Alignment, Modify, Style};
use tabled::{Table, Tabled};

/// One analyzer's result, for `sonargate analyze`.
#[derive(Tabled)]
pub struct AnalyzerResultRow {
    /// Analyzer name.
    #[tabled(rename = "Analyzer")]
    pub analyzer: String,
    /// Status ladder value reported.
    #[tabled(rename = "Status")]
    pub status: String,
    /// Confidence, `0.0..=1.0`.
    #[tabled(rename = "Confidence")]
    pub confidence: String,
    /// Human-readable description.
    #[tabled(rename = "Description")]
    pub description: String,
}

/// One platform's delivery outcome, for `sonargate deliver`.
#[derive(Tabled)]
pub struct PlatformDeliveryRow {
    /// Platform id.
    #[tabled(rename = "Platform")]
    pub platform: String,
    /// This platform's delivery status.
    #[tabled(rename = "Status")]
    pub status: String,
    /// Error message, if any.
    #[tabled(rename = "Error")]
    pub error: String,
}

/// Render `rows` with the house table style: rounded borders, left-aligned
/// body rows.
pub fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Modify::new(Rows::new(1..)).with(Alignment::left()));
    table.to_string()
}
