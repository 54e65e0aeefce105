use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};

use super::{Session, SessionRecord};
use crate::PitdeltaError;

pub fn load_session_jsonl(source_file: &Path) -> Result<Session, PitdeltaError> {
    let records = serde_jsonlines::json_lines(source_file)
        .map_err(|e| PitdeltaError::SessionLoaderError { source: e })?
        .collect::<Result<Vec<SessionRecord>, std::io::Error>>()
        .map_err(|e| PitdeltaError::SessionLoaderError { source: e })?;

    let session = assemble_session(records)?;
    info!(
        "Loaded {:?}: {} with {} laps and {} weather samples",
        source_file,
        session.label(),
        session.laps.len(),
        session.weather.len()
    );
    Ok(session)
}

/// Builds a session out of its file records. The info record must come first,
/// car data can only reference laps that were already declared.
pub fn assemble_session(
    records: impl IntoIterator<Item = SessionRecord>,
) -> Result<Session, PitdeltaError> {
    let mut records = records.into_iter();
    let mut session = match records.next() {
        Some(SessionRecord::Info(info)) => Session::new(info),
        Some(_) => return invalid("the first record must be the session info"),
        None => return invalid("the session file is empty"),
    };

    let mut lap_index: HashMap<(String, u32), usize> = HashMap::new();
    for record in records {
        match record {
            SessionRecord::Info(_) => return invalid("duplicate session info record"),
            SessionRecord::Lap(lap) => {
                let key = (lap.driver.to_uppercase(), lap.lap_number);
                if lap_index.contains_key(&key) {
                    return invalid(&format!("duplicate lap {} for {}", key.1, key.0));
                }
                lap_index.insert(key, session.laps.len());
                session.laps.push(*lap);
            }
            SessionRecord::CarData {
                driver,
                lap_number,
                sample,
            } => {
                if !sample.speed_kph.is_finite() || !sample.throttle.is_finite() {
                    return invalid(&format!(
                        "non finite car data sample in lap {} of {}",
                        lap_number, driver
                    ));
                }
                let Some(idx) = lap_index.get(&(driver.to_uppercase(), lap_number)) else {
                    return invalid(&format!(
                        "car data references unknown lap {} of {}",
                        lap_number, driver
                    ));
                };
                session.laps[*idx].car_data.push(sample);
            }
            SessionRecord::Weather(sample) => session.weather.push(sample),
        }
    }

    // all sorts are stable, samples recorded at the same instant keep file order
    for lap in session.laps.iter_mut() {
        lap.car_data.sort_by_key(|sample| sample.time);
    }
    session
        .laps
        .sort_by_cached_key(|lap| (lap.driver.to_uppercase(), lap.lap_number));
    session.weather.sort_by_key(|sample| sample.time);

    debug!(
        "Assembled {} with {} car data samples",
        session.label(),
        session.laps.iter().map(|lap| lap.car_data.len()).sum::<usize>()
    );
    Ok(session)
}

fn invalid<T>(reason: &str) -> Result<T, PitdeltaError> {
    Err(PitdeltaError::InvalidSessionData {
        reason: reason.to_string(),
    })
}
