use chrono::{DateTime, FixedOffset, Local};

/// Clock used for the signing stamp.
///
/// `System` reads local wall time on every call. `Fixed` pins the stamp, which makes
/// signatures reproducible (golden tests, replaying a captured request).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimePolicy {
    #[default]
    System,
    Fixed(DateTime<FixedOffset>),
}

impl TimePolicy {
    #[must_use]
    pub fn now(self) -> DateTime<FixedOffset> {
        match self {
            TimePolicy::System => Local::now().fixed_offset(),
            TimePolicy::Fixed(at) => at,
        }
    }
}
