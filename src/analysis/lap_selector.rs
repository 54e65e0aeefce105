use itertools::Itertools;

use crate::{
    PitdeltaError,
    session::{Lap, Session},
};

/// Fastest valid lap of `driver` in `session`.
///
/// Laps without a recorded lap time are never representative. On equal lap
/// times the lower lap number wins.
pub fn pick_fastest<'s>(session: &'s Session, driver: &str) -> Result<&'s Lap, PitdeltaError> {
    session
        .laps_for_driver(driver)
        .filter(|lap| lap.is_valid)
        .filter_map(|lap| lap.lap_time.map(|lap_time| (lap, lap_time)))
        .sorted_by_key(|(lap, _)| lap.lap_number)
        // min_by_key keeps the first of equal elements
        .min_by_key(|(_, lap_time)| *lap_time)
        .map(|(lap, _)| lap)
        .ok_or_else(|| PitdeltaError::NoValidLap {
            driver: driver.to_string(),
        })
}
