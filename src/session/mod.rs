pub mod loader;
pub mod repository;
pub mod writer;

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use uom::si::{
    f64::Velocity,
    velocity::{kilometer_per_hour, meter_per_second},
};

use crate::PitdeltaError;

pub use loader::load_session_jsonl;
pub use repository::{FileSessionRepository, SessionRepository};
pub use writer::write_session_jsonl;

/// Tyre rubber type. Parsing accepts any casing and the one letter
/// abbreviations used on timing screens, output is always the canonical label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl Compound {
    pub fn label(&self) -> &'static str {
        match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
            Compound::Intermediate => "INTERMEDIATE",
            Compound::Wet => "WET",
            Compound::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Compound {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "SOFT" | "S" => Compound::Soft,
            "MEDIUM" | "M" => Compound::Medium,
            "HARD" | "H" => Compound::Hard,
            "INTERMEDIATE" | "INTER" | "I" => Compound::Intermediate,
            "WET" | "W" => Compound::Wet,
            _ => Compound::Unknown,
        })
    }
}

impl From<String> for Compound {
    fn from(value: String) -> Self {
        let Ok(compound) = value.parse::<Compound>();
        compound
    }
}

impl From<Compound> for String {
    fn from(value: Compound) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SessionType {
    Practice1,
    Practice2,
    Practice3,
    SprintQualifying,
    Qualifying,
    Sprint,
    Race,
}

impl SessionType {
    /// Short code, also used as the session file name
    pub fn code(&self) -> &'static str {
        match self {
            SessionType::Practice1 => "FP1",
            SessionType::Practice2 => "FP2",
            SessionType::Practice3 => "FP3",
            SessionType::SprintQualifying => "SQ",
            SessionType::Qualifying => "Q",
            SessionType::Sprint => "S",
            SessionType::Race => "R",
        }
    }
}

impl FromStr for SessionType {
    type Err = PitdeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FP1" | "PRACTICE 1" | "FIRSTPRACTICE" => Ok(SessionType::Practice1),
            "FP2" | "PRACTICE 2" | "SECONDPRACTICE" => Ok(SessionType::Practice2),
            "FP3" | "PRACTICE 3" | "THIRDPRACTICE" => Ok(SessionType::Practice3),
            "SQ" | "SPRINT QUALIFYING" | "SPRINT SHOOTOUT" => Ok(SessionType::SprintQualifying),
            "Q" | "QUALIFYING" => Ok(SessionType::Qualifying),
            "S" | "SPRINT" => Ok(SessionType::Sprint),
            "R" | "RACE" => Ok(SessionType::Race),
            other => Err(PitdeltaError::InvalidUserInput {
                field: "session_type".to_string(),
                reason: format!("unknown session type '{}'", other),
            }),
        }
    }
}

impl TryFrom<String> for SessionType {
    type Error = PitdeltaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionType> for String {
    fn from(value: SessionType) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifies one driver's view of one session in the repository cache
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub year: u16,
    pub event: String,
    pub session_type: SessionType,
    pub driver: String,
}

impl SessionKey {
    pub fn new(year: u16, event: &str, session_type: SessionType, driver: &str) -> Self {
        Self {
            year,
            event: event.trim().to_string(),
            session_type,
            driver: driver.trim().to_uppercase(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.year, self.event, self.session_type, self.driver
        )
    }
}

/// A session without a driver, written `2025:Bahrain:R`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRef {
    pub year: u16,
    pub event: String,
    pub session_type: SessionType,
}

impl SessionRef {
    pub fn key(&self, driver: &str) -> SessionKey {
        SessionKey::new(self.year, &self.event, self.session_type, driver)
    }
}

impl FromStr for SessionRef {
    type Err = PitdeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PitdeltaError::InvalidUserInput {
            field: "session".to_string(),
            reason: format!("'{}' {}", s, reason),
        };
        let mut parts = s.splitn(3, ':');
        let (Some(year), Some(event), Some(session_type)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("is not in YEAR:EVENT:SESSION form"));
        };
        let year = year
            .trim()
            .parse::<u16>()
            .map_err(|_| invalid("does not start with a year"))?;
        if event.trim().is_empty() {
            return Err(invalid("has no event name"));
        }
        Ok(Self {
            year,
            event: event.trim().to_string(),
            session_type: session_type.parse()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub year: u16,
    pub event: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub circuit: Option<String>,
}

/// One telemetry tick recorded while a lap was driven
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarDataSample {
    /// Offset from the start of the lap
    #[serde(with = "secs")]
    pub time: Duration,
    /// Speed as recorded by the timing provider
    pub speed_kph: f64,
    /// Throttle pedal, 0=off throttle to 100=full throttle
    pub throttle: f64,
    #[serde(default)]
    pub brake: bool,
    #[serde(default)]
    pub rpm: Option<f64>,
    #[serde(default)]
    pub gear: Option<u8>,
}

impl CarDataSample {
    pub fn speed_mps(&self) -> f64 {
        Velocity::new::<kilometer_per_hour>(self.speed_kph).get::<meter_per_second>()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver: String,
    pub lap_number: u32,
    #[serde(default, with = "secs::option")]
    pub lap_time: Option<Duration>,
    #[serde(default, with = "secs::option")]
    pub sector1_time: Option<Duration>,
    #[serde(default, with = "secs::option")]
    pub sector2_time: Option<Duration>,
    #[serde(default, with = "secs::option")]
    pub sector3_time: Option<Duration>,
    pub compound: Compound,
    /// Laps driven on this set of tyres
    #[serde(default)]
    pub tyre_life: Option<u32>,
    #[serde(default)]
    pub stint: Option<u32>,
    /// Whether the lap counts as a clean timed lap
    pub is_valid: bool,
    /// Stored as separate records in session files
    #[serde(skip)]
    pub car_data: Vec<CarDataSample>,
}

impl Lap {
    pub fn sector_times(&self) -> [Option<Duration>; 3] {
        [self.sector1_time, self.sector2_time, self.sector3_time]
    }
}

/// One ambient condition tick for a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Offset from the start of the session
    #[serde(with = "secs")]
    pub time: Duration,
    pub air_temp_c: f64,
    pub track_temp_c: f64,
    pub humidity_pct: f64,
    pub pressure_mbar: f64,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: f64,
    pub rainfall: bool,
}

/// A fully loaded session. Immutable once the repository hands it out.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub info: SessionInfo,
    pub laps: Vec<Lap>,
    pub weather: Vec<WeatherSample>,
}

impl Session {
    pub fn new(info: SessionInfo) -> Self {
        Self {
            info,
            laps: Vec::new(),
            weather: Vec::new(),
        }
    }

    pub fn laps_for_driver<'a>(&'a self, driver: &str) -> impl Iterator<Item = &'a Lap> {
        self.laps
            .iter()
            .filter(move |lap| lap.driver.eq_ignore_ascii_case(driver))
    }

    pub fn lap(&self, driver: &str, lap_number: u32) -> Option<&Lap> {
        self.laps_for_driver(driver)
            .find(|lap| lap.lap_number == lap_number)
    }

    /// Human readable label, e.g. "2025 Bahrain R"
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.info.year, self.info.event, self.info.session_type
        )
    }
}

/// One line of a session file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionRecord {
    Info(SessionInfo),
    Lap(Box<Lap>),
    CarData {
        driver: String,
        lap_number: u32,
        sample: CarDataSample,
    },
    Weather(WeatherSample),
}

/// Serde helpers storing durations as floating point seconds
pub(crate) mod secs {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<f64>::deserialize(deserializer)?
                .map(|seconds| Duration::try_from_secs_f64(seconds).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn info(event: &str) -> SessionInfo {
        SessionInfo {
            year: 2025,
            event: event.to_string(),
            session_type: SessionType::Race,
            circuit: None,
        }
    }

    pub(crate) fn lap(lap_number: u32, lap_time_s: f64, sectors_s: [f64; 3], valid: bool) -> Lap {
        Lap {
            driver: "VER".to_string(),
            lap_number,
            lap_time: Some(Duration::from_secs_f64(lap_time_s)),
            sector1_time: Some(Duration::from_secs_f64(sectors_s[0])),
            sector2_time: Some(Duration::from_secs_f64(sectors_s[1])),
            sector3_time: Some(Duration::from_secs_f64(sectors_s[2])),
            compound: Compound::Soft,
            tyre_life: Some(lap_number),
            stint: Some(1),
            is_valid: valid,
            car_data: Vec::new(),
        }
    }

    pub(crate) fn sample(time_s: f64, speed_kph: f64, throttle: f64) -> CarDataSample {
        CarDataSample {
            time: Duration::from_secs_f64(time_s),
            speed_kph,
            throttle,
            brake: false,
            rpm: None,
            gear: None,
        }
    }

    pub(crate) fn weather(time_s: f64, air_temp_c: f64) -> WeatherSample {
        WeatherSample {
            time: Duration::from_secs_f64(time_s),
            air_temp_c,
            track_temp_c: air_temp_c + 10.,
            humidity_pct: 40.,
            pressure_mbar: 1010.,
            wind_speed_mps: 1.5,
            wind_direction_deg: 180.,
            rainfall: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_labels_are_canonical() {
        for spelling in ["soft", "SOFT", "Soft", " s "] {
            assert_eq!(spelling.parse::<Compound>().unwrap(), Compound::Soft);
        }
        assert_eq!("INTER".parse::<Compound>().unwrap(), Compound::Intermediate);
        assert_eq!("TEST_UNKNOWN".parse::<Compound>().unwrap(), Compound::Unknown);
        assert_eq!(Compound::Medium.to_string(), "MEDIUM");
    }

    #[test]
    fn test_compound_serializes_as_label() {
        let json = serde_json::to_string(&Compound::Hard).unwrap();
        assert_eq!(json, "\"HARD\"");
        let parsed: Compound = serde_json::from_str("\"h\"").unwrap();
        assert_eq!(parsed, Compound::Hard);
    }

    #[test]
    fn test_session_type_parsing() {
        assert_eq!("R".parse::<SessionType>().unwrap(), SessionType::Race);
        assert_eq!("Race".parse::<SessionType>().unwrap(), SessionType::Race);
        assert_eq!(
            "Practice 2".parse::<SessionType>().unwrap(),
            SessionType::Practice2
        );
        assert_eq!("q".parse::<SessionType>().unwrap(), SessionType::Qualifying);
        assert!(matches!(
            "Warmup".parse::<SessionType>(),
            Err(PitdeltaError::InvalidUserInput { .. })
        ));
    }

    #[test]
    fn test_session_key_normalizes_driver() {
        let key = SessionKey::new(2025, " Bahrain ", SessionType::Race, "ver");
        assert_eq!(key.driver, "VER");
        assert_eq!(key.event, "Bahrain");
        assert_eq!(key.to_string(), "2025 Bahrain R VER");
    }

    #[test]
    fn test_session_ref_parsing() {
        let session: SessionRef = "2025:Emilia Romagna:Q".parse().unwrap();
        assert_eq!(session.year, 2025);
        assert_eq!(session.event, "Emilia Romagna");
        assert_eq!(session.session_type, SessionType::Qualifying);
        assert_eq!(session.key("lec").to_string(), "2025 Emilia Romagna Q LEC");

        for input in ["2025:Bahrain", "year:Bahrain:R", "2025::R", "2025:Bahrain:X"] {
            assert!(input.parse::<SessionRef>().is_err(), "{} should not parse", input);
        }
    }

    #[test]
    fn test_speed_conversion() {
        let sample = fixtures::sample(0., 36., 100.);
        assert!((sample.speed_mps() - 10.).abs() < 1e-9);
    }

    #[test]
    fn test_lap_durations_round_trip_as_seconds() {
        let mut lap = fixtures::lap(2, 90.8, [29.9, 30.9, 30.0], true);
        lap.sector3_time = None;
        let json = serde_json::to_value(&lap).unwrap();
        assert!((json["lap_time"].as_f64().unwrap() - 90.8).abs() < 1e-9);
        assert!(json["sector3_time"].is_null());
        assert!(json.get("car_data").is_none());

        let parsed: Lap = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.sector3_time, None);
        let round_trip = parsed.lap_time.unwrap().as_secs_f64();
        assert!((round_trip - 90.8).abs() < 1e-9);
    }

    #[test]
    fn test_laps_for_driver_ignores_case() {
        let mut session = Session::new(fixtures::info("Bahrain"));
        session.laps.push(fixtures::lap(1, 91.2, [30.1, 31.0, 30.1], true));
        let mut other = fixtures::lap(1, 92.0, [30.5, 31.0, 30.5], true);
        other.driver = "HAM".to_string();
        session.laps.push(other);

        assert_eq!(session.laps_for_driver("ver").count(), 1);
        assert!(session.lap("HAM", 1).is_some());
        assert!(session.lap("HAM", 2).is_none());
        assert_eq!(session.label(), "2025 Bahrain R");
    }
}
