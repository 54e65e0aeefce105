use itertools::Itertools;
use serde::Serialize;

use crate::session::{Compound, Session};

/// One lap of a tyre degradation trend
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TyrePoint {
    pub lap_number: u32,
    /// None when the timing feed did not record a lap time
    pub lap_time_s: Option<f64>,
    pub compound: Compound,
    pub tyre_life: Option<u32>,
    pub stint: Option<u32>,
}

/// Every lap `driver` completed in `session`, ordered by lap number.
///
/// Unlike lap selection this keeps invalid laps, degradation needs the full
/// history. A driver without laps yields an empty series.
pub fn tyre_series(session: &Session, driver: &str) -> Vec<TyrePoint> {
    session
        .laps_for_driver(driver)
        .sorted_by_key(|lap| lap.lap_number)
        .map(|lap| TyrePoint {
            lap_number: lap.lap_number,
            lap_time_s: lap.lap_time.map(|lap_time| lap_time.as_secs_f64()),
            compound: lap.compound,
            tyre_life: lap.tyre_life,
            stint: lap.stint,
        })
        .collect()
}

/// Splits a series in one trend per compound, in order of first use
pub fn group_by_compound(series: &[TyrePoint]) -> Vec<(Compound, Vec<TyrePoint>)> {
    series
        .iter()
        .map(|point| point.compound)
        .unique()
        .map(|compound| {
            let points = series
                .iter()
                .filter(|point| point.compound == compound)
                .cloned()
                .collect();
            (compound, points)
        })
        .collect()
}
