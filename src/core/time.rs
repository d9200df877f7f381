use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Wall-clock source injected through application state so countdown and
/// lateness logic stay deterministic under test.
pub(crate) trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn now_primitive(&self) -> PrimitiveDateTime {
        to_primitive_utc(self.now())
    }
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::sync::Mutex<OffsetDateTime>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self { now: std::sync::Mutex::new(now) }
    }

    pub(crate) fn advance(&self, delta: time::Duration) {
        let mut guard = self.now.lock().expect("clock lock");
        *guard += delta;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("clock lock")
    }
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn manual_clock_advances() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 0, 0).unwrap();
        let start = PrimitiveDateTime::new(date, time).assume_utc();
        let clock = ManualClock::new(start);

        clock.advance(Duration::minutes(5));

        assert_eq!(clock.now(), start + Duration::minutes(5));
        assert_eq!(clock.now_primitive(), to_primitive_utc(start + Duration::minutes(5)));
    }
}
