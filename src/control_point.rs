use thiserror::Error;

/// One row of the `[TimingPoints]` section.
///
/// `beat_len` is overloaded by the file format: positive values define
/// the beat length of an uninherited point, negative values encode the
/// slider-velocity multiplier of an inherited point as `-100 / beat_len`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingPoint {
    pub time: f64,
    pub beat_len: f64,
    pub meter: i32,
    pub sample_set: i32,
    pub sample_index: i32,
    pub volume: i32,
    pub timing_change: bool,
    pub effects: u32,
}

/// The cursor was asked to move backwards in time.
#[derive(Copy, Clone, Debug, Error)]
#[error("timing points accessed non-sequentially, probably an aspire map")]
pub struct NonSequentialTiming;

/// Cursor over the ordered timing points of a map.
///
/// [`TimingPoints::advance`] consumes points up to a monotonically
/// non-decreasing query time and maintains the current beat length and
/// slider-velocity multiplier, from which tick distance and duration
/// derive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingPoints {
    pub points: Vec<TimingPoint>,
    next_idx: usize,
    current_time: f64,
    last_point_time: f64,
    current_beat_len: f64,
    current_sv_multiplier: f64,
    pub base_slider_velocity: f64,
    pub slider_tick_rate: f64,
}

impl TimingPoints {
    pub const DEFAULT_BEAT_LEN: f64 = 60_000.0 / 60.0;

    /// Seed the current beat length from the first point, if any.
    pub fn apply_defaults(&mut self) {
        if let Some(point) = self.points.first() {
            self.current_beat_len = point.beat_len;
        }
    }

    /// Consume every point with `time <= query time`.
    ///
    /// The query times must be non-decreasing across calls and the
    /// consumed points must be ordered; either regression is fatal.
    ///
    /// When several points share a time, the slider-velocity multiplier
    /// resets to 1 at the start of the group, then each point applies in
    /// file order.
    pub fn advance(&mut self, time: f64) -> Result<(), NonSequentialTiming> {
        if self.current_time > time {
            return Err(NonSequentialTiming);
        }

        self.current_time = time;

        while self
            .points
            .get(self.next_idx)
            .is_some_and(|point| point.time <= time)
        {
            let group_time = self.points[self.next_idx].time;

            if group_time < self.last_point_time {
                return Err(NonSequentialTiming);
            }

            self.last_point_time = group_time;
            self.current_sv_multiplier = 1.0;

            loop {
                let point = &self.points[self.next_idx];
                self.next_idx += 1;

                if point.timing_change {
                    self.current_beat_len = point.beat_len.clamp(6.0, 60_000.0);
                } else if point.beat_len < 0.0 {
                    self.current_sv_multiplier = (-100.0 / point.beat_len).clamp(0.1, 10.0);
                }

                let group_continues = self
                    .points
                    .get(self.next_idx)
                    .is_some_and(|point| point.time == group_time);

                if !group_continues {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Geodesic spacing between slider ticks in osu!pixels.
    pub fn tick_distance(&self, version: i32) -> f64 {
        if version >= 8 {
            100.0 * self.current_sv_multiplier * self.base_slider_velocity / self.slider_tick_rate
        } else {
            100.0 * self.base_slider_velocity / self.slider_tick_rate
        }
    }

    /// Temporal spacing between slider ticks in milliseconds.
    pub fn tick_duration(&self, version: i32) -> f64 {
        if version >= 8 {
            self.current_beat_len / self.slider_tick_rate
        } else {
            self.current_beat_len / (self.slider_tick_rate * self.current_sv_multiplier)
        }
    }

    pub fn current_beat_len(&self) -> f64 {
        self.current_beat_len
    }

    pub fn current_sv_multiplier(&self) -> f64 {
        self.current_sv_multiplier
    }
}

impl Default for TimingPoints {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            next_idx: 0,
            current_time: f64::NEG_INFINITY,
            last_point_time: f64::NEG_INFINITY,
            current_beat_len: Self::DEFAULT_BEAT_LEN,
            current_sv_multiplier: 1.0,
            base_slider_velocity: 1.0,
            slider_tick_rate: 1.0,
        }
    }
}
