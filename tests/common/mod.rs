#![allow(dead_code)]

use rosu_events::{Beatmap, HitObject, HitObjectKind, Pos2};

/// A miniature rendition of the osu! tutorial: four circles, a plain
/// linear slider, a repeating linear slider, and a spinner.
pub const TUTORIAL: &str = "\
osu file format v14

[General]
StackLeniency: 0.7
Mode: 0

[Metadata]
Title:osu! tutorial
Creator:peppy

[Difficulty]
HPDrainRate:0
CircleSize:3
OverallDifficulty:0
SliderMultiplier:0.6
SliderTickRate:1

[TimingPoints]
243,374.1233,4,1,0,100,1,0

[HitObjects]
64,280,30172,1,0
192,280,31669,1,0
328,280,33165,1,0
456,280,34662,1,0
72,192,84046,2,0,L|432:192,1,360
136,352,90032,2,0,L|376:352,2,240
100,100,113976,12,0,119587
";

pub fn tutorial() -> Beatmap {
    TUTORIAL.parse().unwrap()
}

/// Times are only specified up to half a millisecond.
pub fn assert_time(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.5,
        "expected time {expected}, got {actual}"
    );
}

pub fn assert_pos(actual: Pos2, x: f32, y: f32) {
    assert!(
        (actual.x - x).abs() < 0.01 && (actual.y - y).abs() < 0.01,
        "expected position ({x}, {y}), got {actual}"
    );
}

pub fn kinds(events: &[HitObject]) -> Vec<HitObjectKind> {
    events.iter().map(|h| h.kind).collect()
}
