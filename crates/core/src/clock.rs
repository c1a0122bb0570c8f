//! Injectable time source. Campaign date windows, impression dedup expiry,
//! and click throttling all read time through this seam so tests can pin it.

use chrono::{DateTime, NaiveDate, Utc};

/// Trait for the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar day in UTC. Campaign windows are date-only and
    /// compared by calendar day in a single zone.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The real system clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clocks, shared by downstream crates' test suites.
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// A clock pinned to a fixed instant, adjustable from tests.
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        pub fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn advance(&self, delta: chrono::Duration) {
            let mut now = self.now.lock().unwrap();
            *now += delta;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}
