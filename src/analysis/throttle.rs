use log::debug;
use serde::{Deserialize, Serialize};

use super::ComparisonPair;
use crate::{
    PitdeltaError,
    session::{CarDataSample, Lap},
};

const MIN_THROTTLE: f64 = 0.;
const MAX_THROTTLE: f64 = 100.;
/// Slack for float error in integrated distances when sizing the shared grid
const GRID_TOLERANCE_M: f64 = 1e-6;
/// Upper bound on the shared grid size, a step this fine is a user error
const MAX_GRID_POINTS: usize = 1_000_000;

/// How the two throttle series are put on a distance axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ThrottleTraceMode {
    /// Each lap keeps its own distance samples, the overlay is visual only
    #[default]
    Raw,
    /// Both laps are linearly interpolated onto a shared grid every `step_m` meters
    Resampled { step_m: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TracePoint {
    /// Meters from the start of the lap
    pub distance_m: f64,
    /// 0=off throttle to 100=full throttle
    pub throttle: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThrottleTrace {
    pub mode: ThrottleTraceMode,
    pub series: ComparisonPair<Vec<TracePoint>>,
}

impl ThrottleTrace {
    /// Throttle of b minus throttle of a at every grid point. Only resampled
    /// traces share distance points, raw traces return None.
    pub fn delta(&self) -> Option<Vec<TracePoint>> {
        match self.mode {
            ThrottleTraceMode::Raw => None,
            ThrottleTraceMode::Resampled { .. } => Some(
                self.series
                    .a
                    .iter()
                    .zip(self.series.b.iter())
                    .map(|(a, b)| TracePoint {
                        distance_m: a.distance_m,
                        throttle: b.throttle - a.throttle,
                    })
                    .collect(),
            ),
        }
    }
}

/// Cumulative distance at each sample, integrating speed over the time
/// elapsed since the previous sample. Starts at 0 and never decreases.
pub fn cumulative_distance(samples: &[CarDataSample]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(samples.len());
    let mut distance = 0.;
    let mut prev_time = samples.first().map(|sample| sample.time);
    for sample in samples {
        if let Some(prev) = prev_time {
            let elapsed_s = sample.time.saturating_sub(prev).as_secs_f64();
            distance += sample.speed_mps().max(0.) * elapsed_s;
        }
        prev_time = Some(sample.time);
        distances.push(distance);
    }
    distances
}

/// (distance, throttle) for every car data sample of `lap`
pub fn throttle_by_distance(lap: &Lap) -> Result<Vec<TracePoint>, PitdeltaError> {
    if lap.car_data.is_empty() {
        return Err(PitdeltaError::EmptyTelemetry {
            driver: lap.driver.clone(),
            lap_number: lap.lap_number,
        });
    }

    let distances = cumulative_distance(&lap.car_data);
    Ok(lap
        .car_data
        .iter()
        .zip(distances)
        .map(|(sample, distance_m)| {
            let throttle = sample.throttle.clamp(MIN_THROTTLE, MAX_THROTTLE);
            if throttle != sample.throttle {
                debug!(
                    "Clamped throttle {} at {:.1}m of lap {}",
                    sample.throttle, distance_m, lap.lap_number
                );
            }
            TracePoint {
                distance_m,
                throttle,
            }
        })
        .collect())
}

/// Raw overlay of the throttle traces of two laps
pub fn throttle_trace(laps: ComparisonPair<&Lap>) -> Result<ThrottleTrace, PitdeltaError> {
    throttle_trace_with_mode(laps, ThrottleTraceMode::Raw)
}

pub fn throttle_trace_with_mode(
    laps: ComparisonPair<&Lap>,
    mode: ThrottleTraceMode,
) -> Result<ThrottleTrace, PitdeltaError> {
    let series = laps.try_map(throttle_by_distance)?;
    let series = match mode {
        ThrottleTraceMode::Raw => series,
        ThrottleTraceMode::Resampled { step_m } => resample(series, step_m)?,
    };
    Ok(ThrottleTrace { mode, series })
}

fn resample(
    series: ComparisonPair<Vec<TracePoint>>,
    step_m: f64,
) -> Result<ComparisonPair<Vec<TracePoint>>, PitdeltaError> {
    if !step_m.is_finite() || step_m <= 0. {
        return Err(PitdeltaError::InvalidUserInput {
            field: "step_m".to_string(),
            reason: format!("resampling step must be a positive distance, got {}", step_m),
        });
    }

    let shared_end = last_distance(&series.a).min(last_distance(&series.b));
    let last_idx = ((shared_end + GRID_TOLERANCE_M) / step_m).floor();
    if last_idx >= MAX_GRID_POINTS as f64 {
        return Err(PitdeltaError::InvalidUserInput {
            field: "step_m".to_string(),
            reason: format!(
                "resampling step {} over {:.1}m exceeds {} grid points",
                step_m, shared_end, MAX_GRID_POINTS
            ),
        });
    }
    let grid: Vec<f64> = (0..=last_idx as usize)
        .map(|idx| idx as f64 * step_m)
        .collect();
    debug!(
        "Resampling throttle traces on {} points up to {:.1}m",
        grid.len(),
        shared_end
    );

    Ok(series.map(|points| interpolate_onto(&points, &grid)))
}

fn last_distance(points: &[TracePoint]) -> f64 {
    points.last().map_or(0., |point| point.distance_m)
}

/// Linear interpolation of `points` at each grid distance. Both inputs must be
/// sorted by distance and the grid must lie within the points' range.
fn interpolate_onto(points: &[TracePoint], grid: &[f64]) -> Vec<TracePoint> {
    let mut cursor = 0;
    grid.iter()
        .map(|&distance_m| {
            while cursor + 1 < points.len() && points[cursor + 1].distance_m < distance_m {
                cursor += 1;
            }
            let lo = points[cursor];
            let throttle = match points.get(cursor + 1) {
                Some(hi) if hi.distance_m > lo.distance_m => {
                    let t = ((distance_m - lo.distance_m) / (hi.distance_m - lo.distance_m))
                        .clamp(0., 1.);
                    lo.throttle + (hi.throttle - lo.throttle) * t
                }
                _ => lo.throttle,
            };
            TracePoint {
                distance_m,
                throttle,
            }
        })
        .collect()
}
