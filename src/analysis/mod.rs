pub mod lap_selector;
pub mod sectors;
pub mod throttle;
pub mod tyres;
pub mod weather;

use std::sync::Arc;

use serde::Serialize;

use crate::{PitdeltaError, session::Session};

pub use lap_selector::pick_fastest;
pub use sectors::{SECTOR_LABELS, SectorComparison, compare_sectors, sector_seconds};
pub use throttle::{
    ThrottleTrace, ThrottleTraceMode, TracePoint, cumulative_distance, throttle_by_distance,
    throttle_trace, throttle_trace_with_mode,
};
pub use tyres::{TyrePoint, group_by_compound, tyre_series};
pub use weather::{WeatherSnapshot, weather_snapshot};

/// A value for each of the two compared subjects
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ComparisonPair<T> {
    pub a: T,
    pub b: T,
}

impl<T> ComparisonPair<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn as_ref(&self) -> ComparisonPair<&T> {
        ComparisonPair::new(&self.a, &self.b)
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ComparisonPair<U> {
        ComparisonPair::new(f(self.a), f(self.b))
    }

    /// Applies `f` to a then b, stopping at the first failure
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(T) -> Result<U, E>,
    ) -> Result<ComparisonPair<U>, E> {
        Ok(ComparisonPair::new(f(self.a)?, f(self.b)?))
    }
}

/// One side of a comparison: a loaded session and the name to show for it
#[derive(Clone, Debug)]
pub struct ComparisonSubject {
    pub label: String,
    pub session: Arc<Session>,
}

impl ComparisonSubject {
    pub fn new(label: &str, session: Arc<Session>) -> Self {
        Self {
            label: label.to_string(),
            session,
        }
    }
}

impl From<Arc<Session>> for ComparisonSubject {
    fn from(session: Arc<Session>) -> Self {
        Self {
            label: session.info.event.clone(),
            session,
        }
    }
}

/// Comparison of a single driver across two sessions. Every view is computed
/// independently, a failing view says nothing about the others.
pub struct SessionComparison {
    subjects: ComparisonPair<ComparisonSubject>,
    driver: String,
    throttle_mode: ThrottleTraceMode,
}

impl SessionComparison {
    pub fn new(a: ComparisonSubject, b: ComparisonSubject, driver: &str) -> Self {
        Self {
            subjects: ComparisonPair::new(a, b),
            driver: driver.trim().to_uppercase(),
            throttle_mode: ThrottleTraceMode::default(),
        }
    }

    pub fn with_throttle_mode(mut self, throttle_mode: ThrottleTraceMode) -> Self {
        self.throttle_mode = throttle_mode;
        self
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn labels(&self) -> ComparisonPair<String> {
        self.subjects.as_ref().map(|subject| subject.label.clone())
    }

    pub fn compare_sectors(&self) -> Result<SectorComparison, PitdeltaError> {
        compare_sectors(
            self.subjects
                .as_ref()
                .map(|subject| (subject.label.as_str(), &*subject.session)),
            &self.driver,
        )
    }

    pub fn tyre_series(&self) -> ComparisonPair<Vec<TyrePoint>> {
        self.subjects
            .as_ref()
            .map(|subject| tyre_series(&subject.session, &self.driver))
    }

    /// Throttle traces of the representative lap of each session
    pub fn throttle_trace(&self) -> Result<ThrottleTrace, PitdeltaError> {
        let laps = self
            .subjects
            .as_ref()
            .try_map(|subject| pick_fastest(&subject.session, &self.driver))?;
        throttle_trace_with_mode(laps, self.throttle_mode)
    }

    pub fn weather_snapshot(&self) -> ComparisonPair<Result<WeatherSnapshot, PitdeltaError>> {
        self.subjects
            .as_ref()
            .map(|subject| weather_snapshot(&subject.session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Compound, fixtures};

    fn subject(event: &str, laps: Vec<crate::session::Lap>) -> ComparisonSubject {
        let mut session = Session::new(fixtures::info(event));
        session.laps = laps;
        session.weather.push(fixtures::weather(0., 25.));
        Arc::new(session).into()
    }

    #[test]
    fn test_pair_helpers() {
        let pair = ComparisonPair::new(2, 3);
        assert_eq!(pair.map(|v| v * 10), ComparisonPair::new(20, 30));
        assert_eq!(
            pair.try_map(|v| if v > 2 { Err(v) } else { Ok(v) }),
            Err(3)
        );
        assert_eq!(pair.as_ref().map(|v| *v + 1), ComparisonPair::new(3, 4));
    }

    #[test]
    fn test_views_fail_independently() {
        let mut with_telemetry = fixtures::lap(2, 90.8, [29.9, 30.9, 30.0], true);
        with_telemetry.car_data = vec![fixtures::sample(0., 100., 100.)];
        let mut without_telemetry = fixtures::lap(1, 92.0, [31.0, 31.0, 30.0], true);
        without_telemetry.compound = Compound::Hard;

        let comparison = SessionComparison::new(
            subject("Bahrain", vec![with_telemetry]),
            subject("Japan", vec![without_telemetry]),
            "ver",
        );

        assert_eq!(comparison.driver(), "VER");
        assert_eq!(
            comparison.labels(),
            ComparisonPair::new("Bahrain".to_string(), "Japan".to_string())
        );
        assert!(comparison.compare_sectors().is_ok());
        assert!(matches!(
            comparison.throttle_trace(),
            Err(PitdeltaError::EmptyTelemetry { lap_number: 1, .. })
        ));
        let tyres = comparison.tyre_series();
        assert_eq!(tyres.b[0].compound, Compound::Hard);
        let weather = comparison.weather_snapshot();
        assert!(weather.a.is_ok() && weather.b.is_ok());
    }

    #[test]
    fn test_throttle_mode_is_applied() {
        let mut lap = fixtures::lap(1, 90., [30., 30., 30.], true);
        lap.car_data = vec![fixtures::sample(0., 36., 0.), fixtures::sample(1., 36., 100.)];

        let comparison = SessionComparison::new(
            subject("Bahrain", vec![lap.clone()]),
            subject("Japan", vec![lap]),
            "VER",
        )
        .with_throttle_mode(ThrottleTraceMode::Resampled { step_m: 2.5 });

        let trace = comparison.throttle_trace().unwrap();
        assert_eq!(trace.series.a.len(), 5);
        assert!(trace.delta().unwrap().iter().all(|p| p.throttle.abs() < 1e-9));
    }
}
