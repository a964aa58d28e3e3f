use rosu_events::{Beatmap, HitObjectKind, ParseErrorKind, Pos2};

use crate::common::{assert_pos, assert_time, kinds, tutorial};

mod common;

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[test]
fn metadata_and_difficulty() {
    let map = tutorial();

    assert_eq!(map.version, 14);
    assert_eq!(map.title(), Some("osu! tutorial"));
    assert_eq!(map.creator(), Some("peppy"));
    assert_eq!(map.stack_leniency(), 0.7);

    assert_eq!(map.difficulty.hp_drain_rate, 0.0);
    assert_eq!(map.difficulty.circle_size, 3.0);
    assert_eq!(map.difficulty.overall_difficulty, 0.0);
    // no ApproachRate entry: falls back to the overall difficulty
    assert_eq!(map.difficulty.approach_rate, 0.0);
    assert_eq!(map.difficulty.slider_multiplier, 0.6);
    assert_eq!(map.difficulty.slider_tick_rate, 1.0);

    assert_eq!(map.timing_points.points.len(), 1);
    let point = &map.timing_points.points[0];
    assert_eq!(point.time, 243.0);
    assert_eq!(point.beat_len, 374.1233);
    assert_eq!(point.meter, 4);
    assert_eq!(point.sample_set, 1);
    assert_eq!(point.sample_index, 0);
    assert_eq!(point.volume, 100);
    assert!(point.timing_change);
    assert_eq!(point.effects, 0);
}

#[test]
fn circles_only() {
    let map = tutorial();

    let expected = [
        (64.0, 280.0, 30_172.0),
        (192.0, 280.0, 31_669.0),
        (328.0, 280.0, 33_165.0),
        (456.0, 280.0, 34_662.0),
    ];

    for (hit_object, (x, y, time)) in map.hit_objects.iter().zip(expected) {
        assert_eq!(hit_object.kind, HitObjectKind::Circle);
        assert_eq!(hit_object.pos, Pos2::new(x, y));
        assert_eq!(hit_object.time, time);
    }
}

#[test]
fn linear_slider_with_ticks() {
    let map = tutorial();
    let events = &map.hit_objects[4..12];

    assert_eq!(
        kinds(events),
        vec![
            HitObjectKind::SliderHead,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderLegacyLastTick,
            HitObjectKind::SliderTail,
        ]
    );

    assert_eq!(events[0].pos, Pos2::new(72.0, 192.0));
    assert_eq!(events[0].time, 84_046.0);

    // beat length 374.1233ms, tick distance 60px over a 360px path
    for k in 1..=5 {
        let tick = events[k];
        assert_pos(tick.pos, lerp(72.0, 432.0, k as f32 / 6.0), 192.0);
        assert_time(tick.time, 84_046.0 + k as f64 * 374.1233);
    }

    assert_pos(events[7].pos, 432.0, 192.0);
    assert_time(events[7].time, 86_291.0);

    // the legacy last tick sits 36ms before the tail
    assert_time(events[6].time, 86_291.0 - 36.0);
    assert!(events[6].time <= events[7].time);
}

#[test]
fn repeating_slider() {
    let map = tutorial();
    let events = &map.hit_objects[12..22];

    assert_eq!(
        kinds(events),
        vec![
            HitObjectKind::SliderHead,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderRepeat,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderTick,
            HitObjectKind::SliderLegacyLastTick,
            HitObjectKind::SliderTail,
        ]
    );

    assert_eq!(events[0].pos, Pos2::new(136.0, 352.0));
    assert_eq!(events[0].time, 90_032.0);

    // forward ticks at quarters of the 240px path
    for k in 1..=3 {
        let tick = events[k];
        assert_pos(tick.pos, lerp(136.0, 376.0, k as f32 / 4.0), 352.0);
        assert_time(tick.time, 90_032.0 + k as f64 * 374.1233);
    }

    // turnaround at the far end
    assert_pos(events[4].pos, 376.0, 352.0);
    assert_time(events[4].time, 90_032.0 + 4.0 * 374.1233);

    // backward ticks mirror the forward ones
    for k in 1..=3 {
        let tick = events[4 + k];
        assert_pos(tick.pos, lerp(136.0, 376.0, (4 - k) as f32 / 4.0), 352.0);
        assert_time(tick.time, 90_032.0 + (4 + k) as f64 * 374.1233);
    }

    // the tail returns to the head position
    assert_pos(events[9].pos, 136.0, 352.0);
    assert_time(events[9].time, 93_025.0);

    // tick order reversal between the two slides yields the same positions
    let forward: Vec<_> = events[1..4].iter().map(|h| h.pos).collect();
    let mut backward: Vec<_> = events[5..8].iter().map(|h| h.pos).collect();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn spinner_centred() {
    let map = tutorial();
    let events = &map.hit_objects[22..];

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, HitObjectKind::SpinnerStart);
    assert_eq!(events[0].pos, Pos2::new(256.0, 192.0));
    assert_eq!(events[0].time, 113_976.0);
    assert_eq!(events[1].kind, HitObjectKind::SpinnerEnd);
    assert_eq!(events[1].pos, Pos2::new(256.0, 192.0));
    assert_eq!(events[1].time, 119_587.0);
}

#[test]
fn events_sorted_by_time() {
    let map = tutorial();

    for pair in map.hit_objects.windows(2) {
        assert!(
            pair[0].time <= pair[1].time,
            "{} emitted after {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn slider_event_census() {
    let map = tutorial();

    let count = |kind: HitObjectKind| {
        map.hit_objects
            .iter()
            .filter(|h| h.kind == kind)
            .count()
    };

    assert_eq!(count(HitObjectKind::SliderHead), 2);
    assert_eq!(count(HitObjectKind::SliderLegacyLastTick), 2);
    assert_eq!(count(HitObjectKind::SliderTail), 2);
    // one slide and two slides: a single turnaround in total
    assert_eq!(count(HitObjectKind::SliderRepeat), 1);
}

#[test]
fn small_time_regression_is_sorted() {
    let map: Beatmap = "\
osu file format v14

[HitObjects]
100,100,10000,1,0
200,200,9500,1,0
"
    .parse()
    .unwrap();

    assert_eq!(map.hit_objects[0].time, 9_500.0);
    assert_eq!(map.hit_objects[1].time, 10_000.0);
}

#[test]
fn aspire_time_regression_is_rejected() {
    let err = "\
osu file format v14

[TimingPoints]
0,500,4,1,0,100,1,0

[HitObjects]
100,100,10000,1,0
100,100,8000,1,0
"
    .parse::<Beatmap>()
    .unwrap_err();

    assert!(matches!(
        err.kind(),
        ParseErrorKind::HitObjectRegression
    ));
    assert_eq!(err.line_number(), Some(8));
}

#[test]
fn timing_point_regression_is_rejected() {
    let err = "\
osu file format v14

[Difficulty]
SliderMultiplier:1
SliderTickRate:1

[TimingPoints]
1000,500,4,1,0,100,1,0
500,400,4,1,0,100,1,0

[HitObjects]
100,100,2000,2,0,L|300:100,1,200
"
    .parse::<Beatmap>()
    .unwrap_err();

    assert!(matches!(
        err.kind(),
        ParseErrorKind::TimingPointRegression
    ));
}

#[test]
fn collinear_perfect_circle_falls_back_to_linear() {
    let map: Beatmap = "\
osu file format v14

[Difficulty]
SliderMultiplier:1
SliderTickRate:1

[TimingPoints]
0,500,4,1,0,100,1,0

[HitObjects]
100,100,1000,2,0,P|200:100|300:100,1,200
"
    .parse()
    .unwrap();

    // all events stay on the straight line through the control points
    for hit_object in &map.hit_objects {
        assert!((hit_object.pos.y - 100.0).abs() < 0.01, "{hit_object}");
    }

    let tail = map.hit_objects.last().unwrap();
    assert_eq!(tail.kind, HitObjectKind::SliderTail);
    assert_pos(tail.pos, 300.0, 100.0);
}

#[test]
fn perfect_circle_ticks_on_the_arc() {
    let map: Beatmap = "\
osu file format v14

[Difficulty]
SliderMultiplier:1
SliderTickRate:1

[TimingPoints]
0,500,4,1,0,100,1,0

[HitObjects]
100,100,1000,2,0,P|200:200|300:100,1,300
"
    .parse()
    .unwrap();

    // circumscribed circle of the three points: centre (200, 100), r 100
    let centre = Pos2::new(200.0, 100.0);

    for hit_object in &map.hit_objects {
        let radius = hit_object.pos.distance(centre);
        assert!(
            (radius - 100.0).abs() < 0.5,
            "{hit_object} is off the arc: r={radius}"
        );
    }

    assert_eq!(kinds(&map.hit_objects).len(), 5);
}

#[test]
fn pre_v8_ticks_ignore_velocity_multiplier() {
    let slider = "\
[Difficulty]
SliderMultiplier:0.6
SliderTickRate:1

[TimingPoints]
243,374.1233,4,1,0,100,1,0
84000,-50,4,1,0,100,0,0

[HitObjects]
72,192,84046,2,0,L|432:192,1,360
";

    let ticks = |version: &str| {
        let map: Beatmap = format!("osu file format v{version}\n\n{slider}")
            .parse()
            .unwrap();

        map.hit_objects
            .iter()
            .filter(|h| h.kind == HitObjectKind::SliderTick)
            .count()
    };

    // doubled velocity doubles the tick spacing on v8+, but only shortens
    // the tick duration on older maps
    assert_eq!(ticks("14"), 2);
    assert_eq!(ticks("7"), 5);
}

#[test]
fn non_positive_meter_is_dropped() {
    let map: Beatmap = "\
osu file format v14

[TimingPoints]
243,374.1233,0,1,0,100,1,0
"
    .parse()
    .unwrap();

    assert!(map.timing_points.points.is_empty());
}

#[test]
fn unknown_sections_are_skipped() {
    let map: Beatmap = "\
osu file format v14

[Colours]
Combo1 : 255,128,64

[Foo]
1,2,3

[HitObjects]
100,100,1000,1,0
"
    .parse()
    .unwrap();

    assert_eq!(map.hit_objects.len(), 1);
}

#[test]
fn bom_is_tolerated() {
    let bytes = "\u{feff}osu file format v14\n\n[HitObjects]\n100,100,1000,1,0\n";
    let map = Beatmap::from_bytes(bytes.as_bytes()).unwrap();

    assert_eq!(map.version, 14);
    assert_eq!(map.hit_objects.len(), 1);
}

#[test]
fn missing_header_is_rejected() {
    let err = "not a beatmap\n".parse::<Beatmap>().unwrap_err();

    assert!(matches!(err.kind(), ParseErrorKind::IncorrectFileHeader));
}

#[test]
fn missing_column_points_at_the_line() {
    let err = "\
osu file format v14

[HitObjects]
100,100
"
    .parse::<Beatmap>()
    .unwrap_err();

    assert!(matches!(err.kind(), ParseErrorKind::ExpectedNumber));
    assert_eq!(err.line_number(), Some(4));
    assert!(err.to_string().contains('^'));
}
