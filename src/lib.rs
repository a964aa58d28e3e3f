//! Library to expand [osu!] beatmap files into discrete, time-ordered
//! gameplay hit events.
//!
//! `rosu-events` decodes the `.osu` text format and performs the full
//! slider expansion the game client does internally: the compact curve
//! description of each slider is rebuilt into its 2D path through
//! adaptive bezier subdivision, circular arc circumscription,
//! Catmull-Rom interpolation, or linear interpolation, then sampled in
//! sync with the time-varying slider velocity of the timing points. The
//! result is one flat, time-ordered event stream of circles, slider
//! heads, ticks, repeats, legacy last ticks, tails, and spinner
//! start/end pairs, suitable for difficulty calculation, replay
//! analysis, or gameplay simulation.
//!
//! ## Usage
//!
//! ```
//! use rosu_events::{Beatmap, HitObjectKind};
//!
//! let map: Beatmap = "osu file format v14
//!
//! [Difficulty]
//! SliderMultiplier:1.0
//! SliderTickRate:1
//!
//! [TimingPoints]
//! 0,500,4,1,0,100,1,0
//!
//! [HitObjects]
//! 100,100,1000,1,0
//! 200,200,2000,1,0
//! "
//! .parse()?;
//!
//! assert_eq!(map.hit_objects.len(), 2);
//! assert!(map
//!     .hit_objects
//!     .iter()
//!     .all(|h| h.kind == HitObjectKind::Circle));
//! # Ok::<_, rosu_events::ParseError>(())
//! ```
//!
//! Maps are usually read from disk instead:
//!
//! ```no_run
//! let map = rosu_events::Beatmap::from_path("./maps/2785319.osu")?;
//!
//! for hit_object in &map.hit_objects {
//!     println!("{hit_object}");
//! }
//! # Ok::<_, rosu_events::ParseError>(())
//! ```
//!
//! After decoding, [`apply_stacking`] nudges temporally and spatially
//! coincident objects apart the way the client renders them, and the
//! [`flip_horizontal`], [`flip_vertical`], and [`apply_timescale`]
//! transforms cover the trivial coordinate- and timescale mods.
//!
//! Parse failures carry the source name, the 1-based line number, and
//! the offending line with a caret marking the column.
//!
//! ## Features
//!
//! | Flag      | Description                                       | Dependencies
//! | --------- | ------------------------------------------------- | ------------
//! | `default` | No features enabled                               |
//! | `serde`   | Derives `Serialize`/`Deserialize` on the data model | [`serde`]
//!
//! [osu!]: https://osu.ppy.sh/home
//! [`serde`]: https://docs.rs/serde

#![deny(rustdoc::broken_intra_doc_links, rustdoc::missing_crate_level_docs)]

mod arena;
mod attributes;
mod beatmap;
mod control_point;
mod curve;
mod error;
mod hit_object;
mod mods;
mod pos2;
mod reader;
mod slider;
mod stacking;

pub use self::{
    attributes::{difficulty_range, DifficultyAttributes},
    beatmap::Beatmap,
    control_point::{NonSequentialTiming, TimingPoint, TimingPoints},
    error::{ParseError, ParseErrorKind, ParseResult},
    hit_object::{HitObject, HitObjectKind},
    mods::{apply_timescale, flip_horizontal, flip_vertical},
    pos2::Pos2,
    stacking::{apply_stacking, apply_stacking_offsets},
};
