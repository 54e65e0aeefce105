use serde_json::{Map, Value};

use crate::{PitdeltaError, session::Session};

/// Field name to value view of one weather sample
pub type WeatherSnapshot = Map<String, Value>;

/// The first recorded weather sample of the session, field by field.
/// Positional first, not an average and not tied to any lap.
pub fn weather_snapshot(session: &Session) -> Result<WeatherSnapshot, PitdeltaError> {
    let sample = session
        .weather
        .first()
        .ok_or_else(|| PitdeltaError::NoWeatherData {
            event: session.label(),
        })?;

    match serde_json::to_value(sample) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(PitdeltaError::InvalidSessionData {
            reason: format!("weather sample is not a record: {}", other),
        }),
        Err(e) => Err(PitdeltaError::InvalidSessionData {
            reason: format!("could not flatten weather sample: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures;
    use serde_json::json;

    #[test]
    fn test_snapshot_uses_first_sample() {
        let mut session = Session::new(fixtures::info("Bahrain"));
        session.weather = vec![fixtures::weather(0., 29.5), fixtures::weather(60., 31.0)];

        let snapshot = weather_snapshot(&session).unwrap();
        assert_eq!(snapshot["air_temp_c"], json!(29.5));
        assert_eq!(snapshot["track_temp_c"], json!(39.5));
        assert_eq!(snapshot["rainfall"], json!(false));
        assert_eq!(snapshot["time"], json!(0.0));
        assert_eq!(snapshot.len(), 8);
    }

    #[test]
    fn test_no_weather_fails() {
        let session = Session::new(fixtures::info("Japan"));
        match weather_snapshot(&session) {
            Err(PitdeltaError::NoWeatherData { event }) => assert_eq!(event, "2025 Japan R"),
            other => panic!("Expected NoWeatherData, got {:?}", other),
        }
    }
}
