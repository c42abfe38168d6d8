use std::time::Duration;

use chrono::{NaiveTime, TimeDelta};

use super::recording::ReplayLog;

/// A backwards step larger than this many hours is read as the recording
/// crossing midnight.
const ROLLOVER_THRESHOLD_HOURS: i64 = 12;

/// Elapsed recording time of every line, measured from the first line.
///
/// Timestamps carry no date, so offsets are kept as plain durations. Steps
/// backwards of less than [`ROLLOVER_THRESHOLD_HOURS`] leave a negative
/// offset, so the line is already overdue when its turn comes.
#[derive(Debug, Clone)]
pub struct Timeline {
    offsets: Vec<TimeDelta>,
}

impl Timeline {
    pub fn new(log: &ReplayLog) -> Self {
        Self::from_times(log.lines().iter().map(|line| line.timestamp()))
    }

    pub fn from_times<I>(times: I) -> Self
    where
        I: IntoIterator<Item = NaiveTime>,
    {
        let mut times = times.into_iter();
        let mut offsets = Vec::new();

        let Some(reference) = times.next() else {
            return Self { offsets };
        };
        offsets.push(TimeDelta::zero());

        let rollover = TimeDelta::hours(ROLLOVER_THRESHOLD_HOURS);
        let mut previous = reference;
        let mut days = TimeDelta::zero();
        for time in times {
            if previous - time > rollover {
                days += TimeDelta::days(1);
            }
            offsets.push(time - reference + days);
            previous = time;
        }

        Self { offsets }
    }

    /// How long after session start line `index` is due. Negative offsets
    /// clamp to zero.
    pub fn due_after(&self, index: usize) -> Duration {
        self.offsets
            .get(index)
            .and_then(|offset| offset.to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Total recorded span from first to last line.
    pub fn span(&self) -> Duration {
        self.offsets
            .len()
            .checked_sub(1)
            .map_or(Duration::ZERO, |last| self.due_after(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32, ms: u32) -> NaiveTime {
        NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap()
    }

    #[test]
    fn offsets_are_relative_to_first_line() {
        let timeline = Timeline::from_times([t(10, 0, 0, 0), t(10, 0, 1, 0), t(10, 0, 3, 250)]);

        assert_eq!(timeline.due_after(0), Duration::ZERO);
        assert_eq!(timeline.due_after(1), Duration::from_secs(1));
        assert_eq!(timeline.due_after(2), Duration::from_millis(3250));
        assert_eq!(timeline.span(), Duration::from_millis(3250));
    }

    #[test]
    fn identical_timestamps_have_no_spacing() {
        let timeline = Timeline::from_times([t(1, 2, 3, 4); 5]);
        for index in 0..5 {
            assert_eq!(timeline.due_after(index), Duration::ZERO);
        }
    }

    #[test]
    fn midnight_rollover_keeps_spacing() {
        let timeline =
            Timeline::from_times([t(23, 59, 59, 0), t(23, 59, 59, 500), t(0, 0, 0, 500)]);

        assert_eq!(timeline.due_after(1), Duration::from_millis(500));
        assert_eq!(timeline.due_after(2), Duration::from_millis(1500));
    }

    #[test]
    fn small_backwards_step_is_overdue() {
        let timeline = Timeline::from_times([t(12, 0, 5, 0), t(12, 0, 4, 0), t(12, 0, 6, 0)]);

        assert_eq!(timeline.due_after(1), Duration::ZERO);
        assert_eq!(timeline.due_after(2), Duration::from_secs(1));
    }

    #[test]
    fn out_of_range_index_is_zero() {
        let timeline = Timeline::from_times([t(0, 0, 0, 0)]);
        assert_eq!(timeline.due_after(7), Duration::ZERO);
        assert_eq!(Timeline::from_times([]).span(), Duration::ZERO);
    }
}
