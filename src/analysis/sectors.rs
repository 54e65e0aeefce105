use serde::Serialize;

use super::{ComparisonPair, lap_selector::pick_fastest};
use crate::{
    PitdeltaError,
    session::{Lap, Session},
};

pub const SECTOR_LABELS: [&str; 3] = ["Sector 1", "Sector 2", "Sector 3"];

/// Sector times of the representative lap of each session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectorComparison {
    pub sector_labels: [&'static str; 3],
    pub labels: ComparisonPair<String>,
    pub lap_numbers: ComparisonPair<u32>,
    pub series: ComparisonPair<[f64; 3]>,
}

impl SectorComparison {
    /// Per sector difference, positive when subject b was slower
    pub fn deltas(&self) -> [f64; 3] {
        let (a, b) = (self.series.a, self.series.b);
        [b[0] - a[0], b[1] - a[1], b[2] - a[2]]
    }
}

/// Sector 1, 2 and 3 durations of `lap` in seconds.
///
/// A missing sector time fails the whole lap, there is no substitute value.
pub fn sector_seconds(lap: &Lap) -> Result<[f64; 3], PitdeltaError> {
    let mut seconds = [0.; 3];
    for (idx, sector_time) in lap.sector_times().into_iter().enumerate() {
        let sector_time = sector_time.ok_or_else(|| PitdeltaError::IncompleteSectorData {
            driver: lap.driver.clone(),
            lap_number: lap.lap_number,
            sector: idx + 1,
        })?;
        seconds[idx] = sector_time.as_secs_f64();
    }
    Ok(seconds)
}

pub fn compare_sectors(
    sessions: ComparisonPair<(&str, &Session)>,
    driver: &str,
) -> Result<SectorComparison, PitdeltaError> {
    let laps = sessions.try_map(|(_, session)| pick_fastest(session, driver))?;
    Ok(SectorComparison {
        sector_labels: SECTOR_LABELS,
        labels: sessions.map(|(label, _)| label.to_string()),
        lap_numbers: laps.map(|lap| lap.lap_number),
        series: laps.try_map(sector_seconds)?,
    })
}
