/// The numeric attributes of a map's `[Difficulty]` section.
///
/// Defaults are in place before the section is parsed; an approach rate
/// that was never set falls back to the overall difficulty once the map
/// is fully decoded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifficultyAttributes {
    pub hp_drain_rate: f32,
    pub circle_size: f32,
    pub overall_difficulty: f32,
    pub approach_rate: f32,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

impl Default for DifficultyAttributes {
    fn default() -> Self {
        Self {
            hp_drain_rate: 5.0,
            circle_size: 5.0,
            overall_difficulty: 5.0,
            approach_rate: f32::NAN,
            slider_multiplier: 1.0,
            slider_tick_rate: 1.0,
        }
    }
}

/// Map a difficulty value through the piecewise-linear osu! range with
/// anchors at difficulty 0, 5, and 10.
pub fn difficulty_range(difficulty: f64, min: f64, mid: f64, max: f64) -> f64 {
    if difficulty > 5.0 {
        mid + (max - mid) * (difficulty - 5.0) / 5.0
    } else if difficulty < 5.0 {
        mid - (mid - min) * (5.0 - difficulty) / 5.0
    } else {
        mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_anchors() {
        assert_eq!(difficulty_range(0.0, 1800.0, 1200.0, 450.0), 1800.0);
        assert_eq!(difficulty_range(5.0, 1800.0, 1200.0, 450.0), 1200.0);
        assert_eq!(difficulty_range(10.0, 1800.0, 1200.0, 450.0), 450.0);
        assert_eq!(difficulty_range(7.5, 1800.0, 1200.0, 450.0), 825.0);
    }
}
