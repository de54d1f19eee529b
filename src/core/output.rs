//! Text renderings of analytics results for CLI surfaces.

use crate::core::analytics::{ChartData, ReportRow};
use crate::core::error::{Result, RideLogError};

/// Shortest round-trip form of a float, always with a fractional part
/// (`5.0`, `6.25`).
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

/// Report rows as comma-separated lines, no header, `\n` terminated.
pub fn render_report_csv(rows: &[ReportRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record([
            row.start_x.to_string(),
            row.start_y.to_string(),
            row.stop_x.to_string(),
            row.stop_y.to_string(),
            row.user_id.clone(),
            format_float(row.distance),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RideLogError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| RideLogError::InvalidInput(e.to_string()))
}

/// Chart title followed by one `index,dispersion` line per point.
pub fn render_chart_text(chart: &ChartData) -> String {
    let mut out = String::new();
    out.push_str(&chart.title);
    out.push('\n');
    for point in &chart.points {
        out.push_str(&format!(
            "{},{}\n",
            point.ride_index,
            format_float(point.dispersion)
        ));
    }
    out
}
