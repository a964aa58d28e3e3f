use crate::attributes::difficulty_range;
use crate::beatmap::Beatmap;
use crate::hit_object::{HitObject, HitObjectKind};
use crate::pos2::Pos2;

/// Objects closer than this many osu!pixels stack.
const STACK_DISTANCE: f32 = 3.0;

/// Nudge temporally and spatially coincident hit objects apart along the
/// diagonal, in place.
///
/// Maps before format version 6 use the legacy forward pass, later maps
/// the reverse pass. The time window scales with the approach rate and
/// the map's stack leniency, the offset with the circle size.
pub fn apply_stacking(map: &mut Beatmap) {
    let time_preempt = difficulty_range(
        f64::from(map.difficulty.approach_rate),
        1800.0,
        1200.0,
        450.0,
    );
    let time_threshold = time_preempt * f64::from(map.stack_leniency());

    let scale = (1.0 - 0.7 * (map.difficulty.circle_size - 5.0) / 5.0) / 2.0;
    let stack_offset = scale * -6.4;

    let version = map.version;

    apply_stacking_offsets(
        &mut map.hit_objects,
        version,
        time_threshold,
        STACK_DISTANCE,
        stack_offset,
    );
}

/// [`apply_stacking`] with explicit thresholds.
pub fn apply_stacking_offsets(
    hit_objects: &mut [HitObject],
    version: i32,
    time_threshold: f64,
    distance_threshold: f32,
    stack_offset: f32,
) {
    let stack_heights = if version < 6 {
        legacy_stack_heights(hit_objects, time_threshold, distance_threshold)
    } else {
        stack_heights(hit_objects, time_threshold, distance_threshold)
    };

    // Each start event's stack height shifts it and its interior events
    // until the next start event.
    let mut total_offset = 0.0;

    for (hit_object, height) in hit_objects.iter_mut().zip(stack_heights) {
        if hit_object.kind.is_start_event() {
            total_offset = height as f32 * stack_offset;
        }

        hit_object.pos.x += total_offset;
        hit_object.pos.y += total_offset;
    }
}

/// Forward pass used by maps before format version 6.
fn legacy_stack_heights(
    hit_objects: &[HitObject],
    time_threshold: f64,
    distance_threshold: f32,
) -> Vec<i32> {
    let mut stack_heights = vec![0_i32; hit_objects.len()];
    let d_squared = distance_threshold * distance_threshold;

    let mut i = 0;

    while i < hit_objects.len() {
        let curr = hit_objects[i];
        let curr_idx = i;
        i += 1;

        let mut slider_path_end: Option<Pos2> = None;

        while i < hit_objects.len() && !hit_objects[i].kind.is_start_event() {
            let kind = hit_objects[i].kind;

            if slider_path_end.is_none()
                && matches!(kind, HitObjectKind::SliderRepeat | HitObjectKind::SliderTail)
            {
                slider_path_end = Some(hit_objects[i].pos);
            }

            i += 1;
        }

        if stack_heights[curr_idx] != 0 && curr.kind != HitObjectKind::SliderHead {
            continue;
        }

        let mut last_stack_time: Option<f64> = None;
        let mut slider_stack = 0;

        for j in i..hit_objects.len() {
            if !hit_objects[j].kind.is_start_event() {
                continue;
            }

            let stack_time = *last_stack_time.get_or_insert(hit_objects[j - 1].time);

            if hit_objects[j].time - stack_time > time_threshold {
                break;
            }

            if (curr.pos - hit_objects[j].pos).length_squared() < d_squared {
                stack_heights[curr_idx] += 1;
                last_stack_time = None;
            } else if let Some(end) = slider_path_end {
                if (end - hit_objects[j].pos).length_squared() < d_squared {
                    // * Case for sliders - bump notes down and right, rather than up and left.
                    slider_stack += 1;
                    stack_heights[j] -= slider_stack;
                    last_stack_time = None;
                }
            }
        }
    }

    stack_heights
}

/// Reverse pass used by maps of format version 6 and later.
fn stack_heights(
    hit_objects: &[HitObject],
    time_threshold: f64,
    distance_threshold: f32,
) -> Vec<i32> {
    let mut stack_heights = vec![0_i32; hit_objects.len()];
    let d_squared = distance_threshold * distance_threshold;

    for i in (1..hit_objects.len()).rev() {
        let mut n = i;

        // * We should check every note which has not yet got a stack.
        // * Consider the case we have two interwound stacks and this will make sense.
        // *   o <-1      o <-2
        // *    o <-3      o <-4
        // * We first process starting from 4 and handle 2,
        // * then we come backwards on the i loop iteration until we reach 3 and handle 1.
        // * 2 and 1 will be ignored in the i loop because they already have a stack value.

        let object_i = hit_objects[i];

        if stack_heights[i] != 0 || !object_i.kind.is_target_circle() {
            continue;
        }

        // * If this object is a hitcircle, then we enter this "special" case.
        // * It either ends with a stack of hitcircles only, or a stack of hitcircles
        // * that are underneath a slider.
        // * Any other case is handled by the slider head code below this.
        if object_i.kind == HitObjectKind::Circle {
            let mut slider_end_pos = Pos2::ZERO;
            let mut stack_pos = object_i.pos;
            let mut stack_time = object_i.time;
            let mut stack_height = 0;

            while n > 0 {
                n -= 1;

                if stack_time - hit_objects[n].time > time_threshold {
                    // * We are no longer within stacking range of the previous object.
                    break;
                }

                if hit_objects[n].kind == HitObjectKind::SliderTail {
                    slider_end_pos = hit_objects[n].pos;
                }

                while n > 0 && !hit_objects[n].kind.is_start_event() {
                    n -= 1;
                }

                let object_n = hit_objects[n];

                if object_n.kind == HitObjectKind::SliderHead
                    && (slider_end_pos - stack_pos).length_squared() < d_squared
                {
                    let offset = stack_height - stack_heights[n] + 1;

                    for j in n + 1..=i {
                        // * For each object which was declared under this slider, we will
                        // * offset it to appear *below* the slider end (rather than above).
                        if hit_objects[j].kind.is_target_circle()
                            && (slider_end_pos - hit_objects[j].pos).length_squared() < d_squared
                        {
                            stack_heights[j] -= offset;
                        }
                    }

                    // * We have hit a slider. We should restart calculation using this as the
                    // * new base. Breaking here will mean that the slider still has a stack
                    // * height of 0, so will be handled in the i-outer-loop.
                    break;
                }

                if object_n.kind.is_target_circle()
                    && (object_n.pos - stack_pos).length_squared() < d_squared
                {
                    // * Keep processing as if there are no sliders. If we come across a
                    // * slider, this gets cancelled out.
                    // * NOTE: Sliders with start positions stacking are a special case that
                    // * is also handled here.
                    stack_height += 1;
                    stack_heights[n] = stack_height;
                    stack_pos = object_n.pos;
                    stack_time = object_n.time;
                }
            }
        } else if object_i.kind == HitObjectKind::SliderHead {
            // * We have hit the first slider in a possible stack.
            // * From this point on, we ALWAYS stack positive regardless.
            let mut stack_height = 0;
            let mut stack_pos = object_i.pos;
            let mut stack_time = object_i.time;

            while n > 0 {
                n -= 1;

                let end_position = hit_objects[n].pos;

                while n > 0 && !hit_objects[n].kind.is_start_event() {
                    n -= 1;
                }

                let object_n = hit_objects[n];

                if stack_time - object_n.time > time_threshold {
                    // * We are no longer within stacking range of the previous object.
                    break;
                }

                if (end_position - stack_pos).length_squared() < d_squared {
                    stack_height += 1;
                    stack_heights[n] = stack_height;
                    stack_pos = object_n.pos;
                    stack_time = object_n.time;
                }
            }
        }
    }

    stack_heights
}
