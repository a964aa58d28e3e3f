use std::fmt;

use crate::pos2::Pos2;

/// The kind of a discrete gameplay event.
///
/// Sliders expand into a head, interior ticks, a repeat per direction
/// change, a legacy last tick, and a tail; spinners split into a
/// start/end pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitObjectKind {
    Circle,
    SliderHead,
    SliderTick,
    SliderRepeat,
    SliderLegacyLastTick,
    SliderTail,
    SpinnerStart,
    SpinnerEnd,
}

impl HitObjectKind {
    /// Whether the event opens a new hit object.
    pub const fn is_start_event(self) -> bool {
        matches!(
            self,
            Self::Circle | Self::SliderHead | Self::SpinnerStart
        )
    }

    /// Whether the event is a clickable circle for stacking purposes.
    pub const fn is_target_circle(self) -> bool {
        matches!(self, Self::Circle | Self::SliderHead)
    }
}

impl fmt::Display for HitObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Circle => "circle",
            Self::SliderHead => "slider_head",
            Self::SliderTick => "slider_tick",
            Self::SliderRepeat => "slider_repeat",
            Self::SliderLegacyLastTick => "slider_legacy_last_tick",
            Self::SliderTail => "slider_tail",
            Self::SpinnerStart => "spinner_start",
            Self::SpinnerEnd => "spinner_end",
        };

        f.write_str(name)
    }
}

/// A discrete gameplay event with a playfield position and a time in
/// milliseconds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitObject {
    pub kind: HitObjectKind,
    pub pos: Pos2,
    pub time: f64,
}

impl HitObject {
    pub(crate) const fn new(kind: HitObjectKind, pos: Pos2, time: f64) -> Self {
        Self { kind, pos, time }
    }
}

impl fmt::Display for HitObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HitObject({} x={} y={} time={})",
            self.kind, self.pos.x, self.pos.y, self.time
        )
    }
}
