use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use super::{Session, SessionRecord};
use crate::PitdeltaError;

/// Writes a session in the JSON lines layout `load_session_jsonl` reads
pub fn write_session_jsonl(file: &Path, session: &Session) -> Result<(), PitdeltaError> {
    let session_file =
        File::create(file).map_err(|e| PitdeltaError::SessionWriterError { source: e })?;
    let mut session_file_writer = BufWriter::new(session_file);

    for record in session_records(session) {
        let line = serde_json::to_string(&record).map_err(|e| PitdeltaError::InvalidSessionData {
            reason: format!("could not serialize session record: {}", e),
        })?;
        writeln!(session_file_writer, "{}", line)
            .map_err(|e| PitdeltaError::SessionWriterError { source: e })?;
    }
    session_file_writer
        .flush()
        .map_err(|e| PitdeltaError::SessionWriterError { source: e })?;
    Ok(())
}

fn session_records(session: &Session) -> impl Iterator<Item = SessionRecord> + '_ {
    let info = std::iter::once(SessionRecord::Info(session.info.clone()));
    let laps = session.laps.iter().flat_map(|lap| {
        let header = SessionRecord::Lap(Box::new(lap.clone()));
        std::iter::once(header).chain(lap.car_data.iter().map(|sample| SessionRecord::CarData {
            driver: lap.driver.clone(),
            lap_number: lap.lap_number,
            sample: sample.clone(),
        }))
    });
    let weather = session.weather.iter().cloned().map(SessionRecord::Weather);
    info.chain(laps).chain(weather)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{fixtures, load_session_jsonl};
    use tempfile::tempdir;

    #[test]
    fn test_written_session_loads_back() {
        let mut session = Session::new(fixtures::info("Japan"));
        let mut lap = fixtures::lap(3, 93.5, [31.5, 31.0, 31.0], true);
        lap.car_data = vec![
            fixtures::sample(0., 290., 100.),
            fixtures::sample(0.25, 292., 100.),
            fixtures::sample(0.5, 180., 0.),
        ];
        session.laps.push(lap);
        session.weather.push(fixtures::weather(0., 18.));

        let dir = tempdir().unwrap();
        let path = dir.path().join("R.jsonl");
        write_session_jsonl(&path, &session).unwrap();

        let loaded = load_session_jsonl(&path).unwrap();
        assert_eq!(loaded.info, session.info);
        assert_eq!(loaded.laps.len(), 1);
        assert_eq!(loaded.laps[0].car_data.len(), 3);
        assert_eq!(loaded.laps[0].car_data[2].throttle, 0.);
        assert_eq!(loaded.weather.len(), 1);
    }
}
