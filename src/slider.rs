use crate::arena::Arena;
use crate::control_point::{NonSequentialTiming, TimingPoints};
use crate::curve::{self, CircularArc, SegmentKind};
use crate::hit_object::{HitObject, HitObjectKind};
use crate::pos2::Pos2;

const LEGACY_LAST_TICK_OFFSET: f64 = 36.0;

/// One point of a slider path, relative to the slider head.
///
/// A `new_segment_type` marks the start of a new path segment; the
/// previous segment ends on the same point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct SliderControlPoint {
    pub new_segment_type: Option<SegmentKind>,
    pub pos: Pos2,
}

/// A parsed slider before expansion.
#[derive(Clone, Debug)]
pub(crate) struct SliderData<'a> {
    pub head: HitObject,
    pub control_points: &'a [SliderControlPoint],
    pub slide_count: i32,
    /// Declared pixel length of one slide.
    pub length: f64,
}

#[derive(Copy, Clone, Debug)]
struct SliderTick {
    /// Offset in milliseconds from the start of a slide.
    time: f64,
    /// Offset from the slider head.
    pos: Pos2,
}

/// Where along the path a given arc length lies.
enum Sampler<'a> {
    Polyline {
        path: &'a [Pos2],
        cumulative: &'a [f64],
    },
    Arc(&'a CircularArc),
}

impl Sampler<'_> {
    fn position_at(&self, distance: f64) -> Pos2 {
        match self {
            Self::Polyline { path, cumulative } => position_at(path, cumulative, distance),
            Self::Arc(arc) => arc.position_at_distance(distance),
        }
    }
}

fn position_at(path: &[Pos2], cumulative: &[f64], distance: f64) -> Pos2 {
    let i = cumulative.partition_point(|&len| len < distance);

    if i == 0 {
        return path[0];
    }

    if i >= path.len() {
        return path[path.len() - 1];
    }

    let len = cumulative[i] - cumulative[i - 1];

    if len <= f64::EPSILON {
        return path[i - 1];
    }

    let t = ((distance - cumulative[i - 1]) / len) as f32;

    Pos2::lerp(path[i - 1], path[i], t)
}

/// Expands sliders into their discrete hit events.
///
/// The polyline, cumulative-length, and tick buffers only live for one
/// slider; keeping them here avoids reallocating per slider. None of
/// them escape the expansion call.
pub(crate) struct SliderExpander {
    segment: Vec<Pos2>,
    path: Vec<Pos2>,
    cumulative: Vec<f64>,
    ticks: Vec<SliderTick>,
    arena: Arena<Pos2>,
}

impl SliderExpander {
    pub(crate) fn new() -> Self {
        Self {
            segment: Vec::new(),
            path: Vec::new(),
            cumulative: Vec::new(),
            ticks: Vec::new(),
            arena: Arena::new(),
        }
    }

    /// Advance the timing cursor to the slider head and emit the head,
    /// ticks, repeats, legacy last tick, and tail onto `events`.
    pub(crate) fn expand(
        &mut self,
        data: &SliderData<'_>,
        timing: &mut TimingPoints,
        version: i32,
        events: &mut Vec<HitObject>,
    ) -> Result<(), NonSequentialTiming> {
        timing.advance(data.head.time)?;

        let tick_distance = timing.tick_distance(version);
        let tick_duration = timing.tick_duration(version);

        events.push(data.head);

        if data.control_points.len() < 2 || tick_distance == 0.0 {
            // no path to travel: the slider collapses onto its head
            events.push(HitObject::new(
                HitObjectKind::SliderLegacyLastTick,
                data.head.pos,
                data.head.time,
            ));
            events.push(HitObject::new(
                HitObjectKind::SliderTail,
                data.head.pos,
                data.head.time,
            ));

            return Ok(());
        }

        self.arena.reset();
        self.path.clear();
        self.cumulative.clear();

        // A slider that is a single three-point PerfectCircle segment is
        // sampled on the true arc; everything else goes through its
        // polyline.
        let arc = single_arc(data);

        let path_length = match arc {
            Some(_) => data.length,
            None => {
                self.build_path(data);

                self.clip_path(data)
            }
        };

        let sampler = match arc {
            Some(ref arc) => Sampler::Arc(arc),
            None => Sampler::Polyline {
                path: &self.path,
                cumulative: &self.cumulative,
            },
        };

        let slide_duration = tick_duration * path_length / tick_distance;

        self.ticks.clear();
        self.ticks.push(SliderTick {
            time: 0.0,
            pos: sampler.position_at(0.0),
        });

        // Empirical guard terminating the tick loop one velocity-second
        // before the end of the path.
        let min_distance_from_end = 10.0 * tick_distance / tick_duration;

        let mut distance = tick_distance;
        let mut time = tick_duration;

        while distance + min_distance_from_end < path_length {
            self.ticks.push(SliderTick {
                time,
                pos: sampler.position_at(distance),
            });

            distance += tick_distance;
            time += tick_duration;
        }

        self.ticks.push(SliderTick {
            time: slide_duration,
            pos: sampler.position_at(path_length),
        });

        let legacy_tick = legacy_last_tick(data, &self.ticks, &sampler, path_length, slide_duration);

        emit_slides(data, &self.ticks, legacy_tick, slide_duration, events);

        Ok(())
    }

    /// Render every segment of the control point list into the polyline.
    fn build_path(&mut self, data: &SliderData<'_>) {
        let cps = data.control_points;

        let mut kind = cps[0].new_segment_type.unwrap_or(SegmentKind::Bezier);
        let mut start = 0;

        for i in 1..cps.len() {
            if let Some(next_kind) = cps[i].new_segment_type {
                self.render_segment(kind, &cps[start..=i]);
                kind = next_kind;
                start = i;
            }
        }

        let cps = &data.control_points[start..];
        self.render_segment(kind, cps);
    }

    fn render_segment(&mut self, kind: SegmentKind, cps: &[SliderControlPoint]) {
        self.segment.clear();
        self.segment.extend(cps.iter().map(|cp| cp.pos));

        curve::append_segment(&mut self.path, kind, &self.segment, &self.arena);
    }

    /// Fill the cumulative length buffer and resolve the effective path
    /// length against the declared one.
    ///
    /// A polyline longer than the declared length is clipped at it. A
    /// shorter one keeps its measured length when the final two control
    /// points coincide, i.e. the slider runs out naturally; otherwise its
    /// final segment is stretched to represent the missing distance.
    fn clip_path(&mut self, data: &SliderData<'_>) -> f64 {
        self.cumulative.push(0.0);

        let declared = data.length;
        let mut total = 0.0;

        for i in 1..self.path.len() {
            let segment = f64::from(self.path[i].distance(self.path[i - 1]));

            if total + segment > declared {
                let t = ((declared - total) / segment) as f32;
                self.path[i] = Pos2::lerp(self.path[i - 1], self.path[i], t);
                self.path.truncate(i + 1);
                self.cumulative.push(declared);

                return declared;
            }

            total += segment;
            self.cumulative.push(total);
        }

        if declared > total {
            let cps = data.control_points;
            let runs_out = cps[cps.len() - 1].pos == cps[cps.len() - 2].pos;

            if !runs_out {
                if let Some(last) = self.cumulative.last_mut() {
                    *last = declared;
                }

                return declared;
            }
        }

        total
    }
}

fn single_arc(data: &SliderData<'_>) -> Option<CircularArc> {
    let [first, rest @ ..] = data.control_points else {
        return None;
    };

    if first.new_segment_type != Some(SegmentKind::PerfectCircle) || rest.len() != 2 {
        return None;
    }

    if rest.iter().any(|cp| cp.new_segment_type.is_some()) {
        return None;
    }

    let positions = [first.pos, rest[0].pos, rest[1].pos];

    CircularArc::from_control_points(&positions)
}

/// The legacy last tick sits 36ms before the end of the final slide,
/// but no earlier than half the total duration and no earlier than the
/// last interior tick.
fn legacy_last_tick(
    data: &SliderData<'_>,
    ticks: &[SliderTick],
    sampler: &Sampler<'_>,
    path_length: f64,
    slide_duration: f64,
) -> HitObject {
    let span_count = f64::from(data.slide_count);
    let final_span_start = (span_count - 1.0) * slide_duration;
    let total_duration = span_count * slide_duration;

    let mut tick_time = (total_duration / 2.0).max(total_duration - LEGACY_LAST_TICK_OFFSET);

    if ticks.len() > 2 {
        let penultimate = if data.slide_count % 2 == 1 {
            final_span_start + ticks[ticks.len() - 2].time
        } else {
            final_span_start + slide_duration - ticks[1].time
        };

        tick_time = tick_time.max(penultimate);
    }

    let mut progress = if slide_duration > 0.0 {
        ((tick_time - final_span_start) / slide_duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    if data.slide_count % 2 == 0 {
        progress = 1.0 - progress;
    }

    HitObject::new(
        HitObjectKind::SliderLegacyLastTick,
        data.head.pos + sampler.position_at(progress * path_length),
        data.head.time + tick_time,
    )
}

/// Walk the tick list once per slide, alternating direction, and emit
/// the events. The final tick of the final slide yields the legacy last
/// tick followed by the tail; the final tick of any other slide is the
/// turnaround repeat.
fn emit_slides(
    data: &SliderData<'_>,
    ticks: &[SliderTick],
    legacy_tick: HitObject,
    slide_duration: f64,
    events: &mut Vec<HitObject>,
) {
    let head_pos = data.head.pos;
    let head_time = data.head.time;
    let last = ticks.len() - 1;

    for span in 0..data.slide_count {
        let span_start = head_time + f64::from(span) * slide_duration;
        let span_end = head_time + f64::from(span + 1) * slide_duration;
        let final_span = span == data.slide_count - 1;

        let mut emit = |tick: SliderTick, time: f64, turnaround: bool| {
            let pos = head_pos + tick.pos;

            if !turnaround {
                events.push(HitObject::new(HitObjectKind::SliderTick, pos, time));
            } else if final_span {
                events.push(legacy_tick);
                events.push(HitObject::new(HitObjectKind::SliderTail, pos, time));
            } else {
                events.push(HitObject::new(HitObjectKind::SliderRepeat, pos, time));
            }
        };

        if span % 2 == 0 {
            for i in 1..=last {
                emit(ticks[i], span_start + ticks[i].time, i == last);
            }
        } else {
            for i in (0..last).rev() {
                emit(ticks[i], span_end - ticks[i].time, i == 0);
            }
        }
    }
}
