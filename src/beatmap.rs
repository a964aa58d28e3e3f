use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::attributes::DifficultyAttributes;
use crate::control_point::{TimingPoint, TimingPoints};
use crate::curve::SegmentKind;
use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::hit_object::{HitObject, HitObjectKind};
use crate::pos2::Pos2;
use crate::reader::{self, LineParser};
use crate::slider::{SliderControlPoint, SliderData, SliderExpander};

pub(crate) const OSU_FILE_HEADER: &str = "osu file format v";

/// Spinners are stored at the playfield centre regardless of their
/// declared coordinates.
const SPINNER_CENTRE: Pos2 = Pos2 { x: 256.0, y: 192.0 };

/// Input rows regressing further than this are aspire maps.
const MAX_TIME_REGRESSION: f64 = 1_000.0;

const CIRCLE_FLAG: u32 = 1 << 0;
const SLIDER_FLAG: u32 = 1 << 1;
const SPINNER_FLAG: u32 = 1 << 3;

/// A fully decoded beatmap: difficulty attributes, timing points, and
/// the expanded, time-ordered hit events.
#[derive(Clone, Debug)]
pub struct Beatmap {
    pub version: i32,
    pub general: HashMap<String, String>,
    pub metadata: HashMap<String, String>,
    pub difficulty: DifficultyAttributes,
    pub timing_points: TimingPoints,
    pub hit_objects: Vec<HitObject>,
}

impl Beatmap {
    pub const FIRST_LAZER_VERSION: i32 = 128;

    /// Parse a [`Beatmap`] by providing a path to a `.osu` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let file = File::open(path)?;

        Self::parse(BufReader::new(file), &source_name)
    }

    /// Parse a [`Beatmap`] by providing the content of a `.osu` file as
    /// a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> ParseResult<Self> {
        Self::parse(bytes, "<bytes>")
    }

    /// Parse a [`Beatmap`] from a buffered reader, attributing errors to
    /// `source_name`.
    pub fn parse<R: BufRead>(src: R, source_name: &str) -> ParseResult<Self> {
        BeatmapParser::new(src, source_name).parse()
    }

    /// The `StackLeniency` entry of the `[General]` section.
    pub fn stack_leniency(&self) -> f32 {
        self.general
            .get("StackLeniency")
            .and_then(|value| value.parse().ok())
            .unwrap_or(0.7)
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get("Title").map(String::as_str)
    }

    pub fn creator(&self) -> Option<&str> {
        self.metadata.get("Creator").map(String::as_str)
    }
}

impl FromStr for Beatmap {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes(), "<str>")
    }
}

#[derive(Copy, Clone, Debug)]
enum Section {
    General,
    Metadata,
    Difficulty,
    TimingPoints,
    HitObjects,
    Unknown,
}

impl Section {
    fn from_name(name: &str) -> Self {
        match name {
            "General" => Self::General,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Unknown,
        }
    }
}

struct BeatmapParser<R> {
    reader: LineParser<R>,
    map: Beatmap,
    expander: SliderExpander,
    /// Control points of the in-flight slider, cleared per slider.
    control_points: Vec<SliderControlPoint>,
    /// Time of the previous input row, for the aspire guard.
    last_time: f64,
    unsorted: bool,
}

impl<R: BufRead> BeatmapParser<R> {
    fn new(src: R, source_name: &str) -> Self {
        Self {
            reader: LineParser::new(src, source_name),
            map: Beatmap {
                version: 0,
                general: HashMap::new(),
                metadata: HashMap::new(),
                difficulty: DifficultyAttributes::default(),
                timing_points: TimingPoints::default(),
                hit_objects: Vec::with_capacity(256),
            },
            expander: SliderExpander::new(),
            control_points: Vec::with_capacity(8),
            last_time: f64::NEG_INFINITY,
            unsorted: false,
        }
    }

    fn parse(mut self) -> ParseResult<Beatmap> {
        self.parse_header()?;

        let mut more = self.reader.read_line()?;

        while more {
            more = self.parse_section()?;
        }

        self.finalize();

        Ok(self.map)
    }

    fn parse_header(&mut self) -> ParseResult<()> {
        if !self.reader.read_line()? {
            return Err(ParseErrorKind::IncorrectFileHeader.into());
        }

        let mut line = self.reader.line();

        if !reader::try_take_prefix(&mut line, OSU_FILE_HEADER) {
            return Err(self.reader.error(ParseErrorKind::IncorrectFileHeader, line));
        }

        self.map.version = self.reader.take_number(&mut line)?;

        Ok(())
    }

    /// Parse the section whose header is the current line.
    ///
    /// Returns whether another section header is pending in the line
    /// buffer.
    fn parse_section(&mut self) -> ParseResult<bool> {
        let Self {
            reader,
            map,
            expander,
            control_points,
            last_time,
            unsorted,
        } = self;

        let header = reader.line();

        if !header.starts_with('[') {
            return Err(reader.error(ParseErrorKind::ExpectedSection, header));
        }

        // Content may follow the header on the same line when a newline
        // went missing; hand it to the section parser as its first row.
        let (section, mut line) = match header.find(']') {
            Some(end) => (
                Section::from_name(&header[1..end]),
                reader::trim_space(&header[end + 1..]),
            ),
            None => (Section::Unknown, ""),
        };

        if matches!(section, Section::Unknown) {
            debug!("skipping section {header}");
        }

        if matches!(section, Section::HitObjects) {
            // [Difficulty] may have been parsed since the timing points
            map.timing_points.base_slider_velocity = map.difficulty.slider_multiplier;
            map.timing_points.slider_tick_rate = map.difficulty.slider_tick_rate;
        }

        loop {
            if !line.is_empty() {
                match section {
                    Section::General => Self::dict_row(reader, &mut map.general, line)?,
                    Section::Metadata => Self::dict_row(reader, &mut map.metadata, line)?,
                    Section::Difficulty => {
                        Self::difficulty_row(reader, &mut map.difficulty, line)?
                    }
                    Section::TimingPoints => {
                        Self::timing_point_row(reader, &mut map.timing_points, line)?
                    }
                    Section::HitObjects => Self::hit_object_row(
                        reader,
                        map,
                        expander,
                        control_points,
                        last_time,
                        unsorted,
                        line,
                    )?,
                    Section::Unknown => {}
                }
            }

            if !reader.read_line()? {
                Self::finish_section(section, map);

                return Ok(false);
            }

            line = reader.line();

            if line.starts_with('[') {
                Self::finish_section(section, map);

                return Ok(true);
            }
        }
    }

    fn finish_section(section: Section, map: &mut Beatmap) {
        if matches!(section, Section::TimingPoints) {
            map.timing_points.base_slider_velocity = map.difficulty.slider_multiplier;
            map.timing_points.slider_tick_rate = map.difficulty.slider_tick_rate;
            map.timing_points.apply_defaults();
        }
    }

    fn finalize(&mut self) {
        if self.map.difficulty.approach_rate.is_nan() {
            self.map.difficulty.approach_rate = self.map.difficulty.overall_difficulty;
        }

        // Small regressions between input rows are tolerated, and the
        // legacy last tick of a very short slider can precede its
        // repeats, but the emitted events are guaranteed time-ordered.
        let unsorted = self.unsorted
            || self
                .map
                .hit_objects
                .windows(2)
                .any(|pair| pair[1].time < pair[0].time);

        if unsorted {
            self.map
                .hit_objects
                .sort_by(|a, b| a.time.total_cmp(&b.time));
        }
    }

    fn dict_row(
        reader: &LineParser<R>,
        dict: &mut HashMap<String, String>,
        line: &str,
    ) -> ParseResult<()> {
        let mut rest = line;
        let key = reader.take_column(&mut rest, ':')?;
        dict.insert(key.to_owned(), rest.to_owned());

        Ok(())
    }

    fn difficulty_row(
        reader: &LineParser<R>,
        difficulty: &mut DifficultyAttributes,
        line: &str,
    ) -> ParseResult<()> {
        let mut rest = line;
        let key = reader.take_column(&mut rest, ':')?;

        if !matches!(
            key,
            "HPDrainRate"
                | "CircleSize"
                | "OverallDifficulty"
                | "ApproachRate"
                | "SliderMultiplier"
                | "SliderTickRate"
        ) {
            return Ok(());
        }

        let value: f64 = reader.take_number(&mut rest)?;

        match key {
            "HPDrainRate" => difficulty.hp_drain_rate = value as f32,
            "CircleSize" => difficulty.circle_size = value as f32,
            "OverallDifficulty" => difficulty.overall_difficulty = value as f32,
            "ApproachRate" => difficulty.approach_rate = value as f32,
            "SliderMultiplier" => difficulty.slider_multiplier = value,
            "SliderTickRate" => difficulty.slider_tick_rate = value,
            _ => unreachable!(),
        }

        Ok(())
    }

    fn timing_point_row(
        reader: &LineParser<R>,
        timing: &mut TimingPoints,
        line: &str,
    ) -> ParseResult<()> {
        let mut rest = line;

        let time: f64 = reader.take_numeric_column(&mut rest, ',')?;
        let beat_len: f64 = reader.take_numeric_column(&mut rest, ',')?;
        let meter: i32 = reader.take_numeric_column(&mut rest, ',')?;

        let sample_set = reader.try_take_numeric_column(&mut rest, ',')?.unwrap_or(0);
        let sample_index = reader.try_take_numeric_column(&mut rest, ',')?.unwrap_or(0);
        let volume = reader.try_take_numeric_column(&mut rest, ',')?.unwrap_or(0);

        let timing_change = match reader.try_take_numeric_column::<i32>(&mut rest, ',')? {
            Some(value) => value != 0,
            None => beat_len >= 0.0,
        };

        let effects = reader
            .try_take_numeric_column::<u32>(&mut rest, ',')?
            .unwrap_or(0);

        if meter <= 0 {
            warn!("dropping timing point at {time}ms with non-positive meter {meter}");

            return Ok(());
        }

        timing.points.push(TimingPoint {
            time,
            beat_len,
            meter,
            sample_set,
            sample_index,
            volume,
            timing_change,
            effects,
        });

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn hit_object_row(
        reader: &LineParser<R>,
        map: &mut Beatmap,
        expander: &mut SliderExpander,
        control_points: &mut Vec<SliderControlPoint>,
        last_time: &mut f64,
        unsorted: &mut bool,
        line: &str,
    ) -> ParseResult<()> {
        let mut rest = line;

        let x: f64 = reader.take_numeric_column(&mut rest, ',')?;
        let y: f64 = reader.take_numeric_column(&mut rest, ',')?;
        let time: f64 = reader.take_numeric_column(&mut rest, ',')?;
        let kind_bits: u32 = reader.take_numeric_column(&mut rest, ',')?;
        let _hit_sound = reader::try_take_column(&mut rest, ',');

        let pos = Pos2::new(x as i32 as f32, y as i32 as f32);

        if *last_time - time > MAX_TIME_REGRESSION {
            return Err(reader.error(ParseErrorKind::HitObjectRegression, line));
        }

        if time < *last_time {
            *unsorted = true;
        }

        *last_time = time;

        if kind_bits & SPINNER_FLAG > 0 {
            let end_time: f64 = reader.take_numeric_column(&mut rest, ',')?;

            map.hit_objects.push(HitObject::new(
                HitObjectKind::SpinnerStart,
                SPINNER_CENTRE,
                time,
            ));
            map.hit_objects.push(HitObject::new(
                HitObjectKind::SpinnerEnd,
                SPINNER_CENTRE,
                end_time.max(time),
            ));
        } else if kind_bits & SLIDER_FLAG > 0 {
            let path_col = reader.take_column(&mut rest, ',')?;
            let slide_count = reader.take_numeric_column::<i32>(&mut rest, ',')?.max(1);
            let length: f64 = reader.take_numeric_column(&mut rest, ',')?;

            Self::parse_control_points(reader, control_points, path_col, pos, map.version)?;

            let data = SliderData {
                head: HitObject::new(HitObjectKind::SliderHead, pos, time),
                control_points: control_points.as_slice(),
                slide_count,
                length,
            };

            expander
                .expand(
                    &data,
                    &mut map.timing_points,
                    map.version,
                    &mut map.hit_objects,
                )
                .map_err(|_| reader.error(ParseErrorKind::TimingPointRegression, line))?;
        } else if kind_bits & CIRCLE_FLAG > 0 {
            map.hit_objects
                .push(HitObject::new(HitObjectKind::Circle, pos, time));
        }

        Ok(())
    }

    /// Decode `T|x1:y1|x2:y2|...` into control points relative to the
    /// head, marking explicit mid-path type changes and implicit segment
    /// breaks on duplicated points.
    fn parse_control_points(
        reader: &LineParser<R>,
        control_points: &mut Vec<SliderControlPoint>,
        path: &str,
        head_pos: Pos2,
        version: i32,
    ) -> ParseResult<()> {
        control_points.clear();

        let mut tokens = path.split('|');
        let first = tokens.next().unwrap_or("");

        let Some(head_kind) = SegmentKind::from_tag(first) else {
            return Err(reader.error(ParseErrorKind::InvalidPathType, first));
        };

        control_points.push(SliderControlPoint {
            new_segment_type: Some(head_kind),
            pos: Pos2::ZERO,
        });

        let mut pending = None;

        for token in tokens {
            if let Some(kind) = SegmentKind::from_tag(token) {
                pending = Some(kind);

                continue;
            }

            let Some((x_str, y_str)) = token.split_once(':') else {
                return Err(reader.error(ParseErrorKind::InvalidCurvePoint, token));
            };

            let mut x_rest = x_str;
            let x: f64 = reader.take_number(&mut x_rest)?;
            let mut y_rest = y_str;
            let y: f64 = reader.take_number(&mut y_rest)?;

            control_points.push(SliderControlPoint {
                new_segment_type: pending.take(),
                pos: Pos2::new(x as i32 as f32, y as i32 as f32) - head_pos,
            });
        }

        // Two consecutive points on the same position start an implicit
        // new segment, except inside Catmull sliders of pre-lazer maps.
        let mut kind = head_kind;

        for i in 1..control_points.len() {
            if let Some(next) = control_points[i].new_segment_type {
                kind = next;

                continue;
            }

            if control_points[i].pos == control_points[i - 1].pos
                && !(kind == SegmentKind::Catmull && version < Beatmap::FIRST_LAZER_VERSION)
            {
                control_points[i].new_segment_type = Some(kind);
            }
        }

        Ok(())
    }
}
