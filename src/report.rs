// Render-ready aggregation of the comparison views

use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::PitdeltaError;
use crate::analysis::{
    ComparisonPair, SectorComparison, SessionComparison, ThrottleTrace, ThrottleTraceMode,
    TracePoint, TyrePoint, WeatherSnapshot, group_by_compound,
};

/// Throttle above this counts as full throttle in summaries
const FULL_THROTTLE_PCT: f64 = 99.;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A view that either computed or failed on its own
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum View<T> {
    Ready { data: T },
    Degraded { reason: String },
}

impl<T> View<T> {
    fn from_result(name: &str, result: Result<T, PitdeltaError>) -> Self {
        match result {
            Ok(data) => View::Ready { data },
            Err(e) => {
                warn!("{} view unavailable: {}", name, e);
                View::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, View::Degraded { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub driver: String,
    pub labels: ComparisonPair<String>,
    pub sectors: View<SectorComparison>,
    pub tyres: ComparisonPair<Vec<TyrePoint>>,
    pub throttle: View<ThrottleTrace>,
    pub weather: ComparisonPair<View<WeatherSnapshot>>,
}

impl ComparisonReport {
    pub fn build(comparison: &SessionComparison) -> Self {
        Self {
            driver: comparison.driver().to_string(),
            labels: comparison.labels(),
            sectors: View::from_result("Sector", comparison.compare_sectors()),
            tyres: comparison.tyre_series(),
            throttle: View::from_result("Throttle", comparison.throttle_trace()),
            weather: comparison
                .weather_snapshot()
                .map(|snapshot| View::from_result("Weather", snapshot)),
        }
    }

    pub fn degraded_views(&self) -> usize {
        [
            self.sectors.is_degraded(),
            self.throttle.is_degraded(),
            self.weather.a.is_degraded(),
            self.weather.b.is_degraded(),
        ]
        .iter()
        .filter(|degraded| **degraded)
        .count()
    }
}

pub fn render(report: &ComparisonReport, format: OutputFormat) -> Result<String, PitdeltaError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|e| PitdeltaError::InvalidSessionData {
                reason: format!("could not serialize report: {}", e),
            })
        }
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &ComparisonReport) -> String {
    let labels = &report.labels;
    let mut lines = vec![
        format!("Driver {}: {} vs {}", report.driver, labels.a, labels.b),
        String::new(),
        "Sector comparison (fastest lap)".to_string(),
    ];

    match &report.sectors {
        View::Ready { data } => {
            lines.push(format!(
                "{:<10}{:>16}{:>16}{:>10}",
                "",
                format!("{} (L{})", labels.a, data.lap_numbers.a),
                format!("{} (L{})", labels.b, data.lap_numbers.b),
                "Delta"
            ));
            let deltas = data.deltas();
            for (idx, sector) in data.sector_labels.iter().enumerate() {
                lines.push(format!(
                    "{:<10}{:>16.3}{:>16.3}{:>+10.3}",
                    sector, data.series.a[idx], data.series.b[idx], deltas[idx]
                ));
            }
        }
        View::Degraded { reason } => lines.push(format!("  unavailable: {}", reason)),
    }

    for (label, series) in [(&labels.a, &report.tyres.a), (&labels.b, &report.tyres.b)] {
        lines.push(String::new());
        lines.extend(tyre_series_lines(label, series));
    }

    lines.push(String::new());
    match &report.throttle {
        View::Ready { data } => {
            lines.push(match data.mode {
                ThrottleTraceMode::Raw => "Throttle trace (raw overlay)".to_string(),
                ThrottleTraceMode::Resampled { step_m } => {
                    format!("Throttle trace (resampled every {} m)", step_m)
                }
            });
            for (label, points) in [(&labels.a, &data.series.a), (&labels.b, &data.series.b)] {
                lines.push(format!("  {}: {}", label, trace_summary(points)));
            }
            if let Some(delta) = data.delta().filter(|delta| !delta.is_empty()) {
                let mean = delta.iter().map(|p| p.throttle).sum::<f64>() / delta.len() as f64;
                lines.push(format!("  mean throttle delta: {:+.1}%", mean));
            }
        }
        View::Degraded { reason } => {
            lines.push("Throttle trace".to_string());
            lines.push(format!("  unavailable: {}", reason));
        }
    }

    lines.push(String::new());
    lines.push("Weather".to_string());
    for (label, weather) in [(&labels.a, &report.weather.a), (&labels.b, &report.weather.b)] {
        let summary = match weather {
            View::Ready { data } => data
                .iter()
                .map(|(field, value)| format!("{}={}", field, value))
                .join(", "),
            View::Degraded { reason } => format!("unavailable: {}", reason),
        };
        lines.push(format!("  {}: {}", label, summary));
    }

    lines.join("\n")
}

fn trace_summary(points: &[TracePoint]) -> String {
    let distance_m = points.last().map_or(0., |point| point.distance_m);
    let full_throttle = points
        .iter()
        .filter(|point| point.throttle >= FULL_THROTTLE_PCT)
        .count();
    let full_throttle_pct = if points.is_empty() {
        0.
    } else {
        full_throttle as f64 * 100. / points.len() as f64
    };
    format!(
        "{} samples over {:.1} m, full throttle {:.1}%",
        points.len(),
        distance_m,
        full_throttle_pct
    )
}

/// Lap times grouped per compound, one line per compound
pub fn tyre_series_lines(label: &str, series: &[TyrePoint]) -> Vec<String> {
    let mut lines = vec![format!("Tyre degradation - {}", label)];
    if series.is_empty() {
        lines.push("  no laps".to_string());
        return lines;
    }
    for (compound, points) in group_by_compound(series) {
        let laps = points
            .iter()
            .map(|point| match point.lap_time_s {
                Some(lap_time_s) => format!("L{} {:.3}", point.lap_number, lap_time_s),
                None => format!("L{} -", point.lap_number),
            })
            .join(", ");
        lines.push(format!("  {:<12} {}", compound.label(), laps));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ComparisonSubject;
    use crate::session::{Session, fixtures};
    use std::sync::Arc;

    fn comparison(weather_b: bool) -> SessionComparison {
        let mut bahrain = Session::new(fixtures::info("Bahrain"));
        let mut lap = fixtures::lap(2, 90.8, [29.9, 30.9, 30.0], true);
        lap.car_data = vec![fixtures::sample(0., 36., 100.), fixtures::sample(1., 36., 50.)];
        bahrain.laps = vec![fixtures::lap(1, 91.2, [30.1, 31.0, 30.1], true), lap];
        bahrain.weather = vec![fixtures::weather(0., 30.)];

        let mut suzuka = Session::new(fixtures::info("Japan"));
        suzuka.laps = vec![fixtures::lap(1, 92.4, [32.0, 35.2, 25.2], true)];
        if weather_b {
            suzuka.weather = vec![fixtures::weather(0., 17.)];
        }

        SessionComparison::new(
            ComparisonSubject::new("Bahrain", Arc::new(bahrain)),
            ComparisonSubject::new("Suzuka", Arc::new(suzuka)),
            "VER",
        )
    }

    #[test]
    fn test_failed_views_are_degraded_not_fatal() {
        let report = ComparisonReport::build(&comparison(false));
        assert!(!report.sectors.is_degraded());
        // Suzuka lap has no car data and no weather
        assert!(report.throttle.is_degraded());
        assert!(!report.weather.a.is_degraded());
        assert!(report.weather.b.is_degraded());
        assert_eq!(report.degraded_views(), 2);
        assert_eq!(report.tyres.a.len(), 2);
    }

    #[test]
    fn test_text_rendering() {
        let report = ComparisonReport::build(&comparison(true));
        let text = render(&report, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Driver VER: Bahrain vs Suzuka"));
        assert!(text.contains("Bahrain (L2)"));
        assert!(text.contains("Sector 1"));
        assert!(text.contains("29.900"));
        assert!(text.contains("Tyre degradation - Suzuka"));
        assert!(text.contains("SOFT"));
        assert!(text.contains("unavailable: Lap 1 of VER has no car data samples"));
        assert!(text.contains("air_temp_c=17"));
    }

    #[test]
    fn test_json_rendering() {
        let report = ComparisonReport::build(&comparison(false));
        let json: serde_json::Value =
            serde_json::from_str(&render(&report, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["driver"], "VER");
        assert_eq!(json["sectors"]["status"], "ready");
        assert_eq!(json["sectors"]["data"]["lap_numbers"]["a"], 2);
        assert_eq!(json["throttle"]["status"], "degraded");
        assert_eq!(json["weather"]["b"]["status"], "degraded");
        assert_eq!(json["tyres"]["a"][0]["compound"], "SOFT");
    }

    #[test]
    fn test_tyre_lines_for_empty_series() {
        let lines = tyre_series_lines("Bahrain", &[]);
        assert_eq!(lines, vec!["Tyre degradation - Bahrain", "  no laps"]);
    }
}
