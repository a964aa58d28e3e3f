use crate::hit_object::HitObject;

/// Mirror all events around the playfield's vertical centre line.
pub fn flip_horizontal(hit_objects: &mut [HitObject]) {
    for hit_object in hit_objects {
        hit_object.pos.x = 512.0 - hit_object.pos.x;
    }
}

/// Mirror all events around the playfield's horizontal centre line.
pub fn flip_vertical(hit_objects: &mut [HitObject]) {
    for hit_object in hit_objects {
        hit_object.pos.y = 384.0 - hit_object.pos.y;
    }
}

/// Scale all event times, e.g. by 1.5 for double time.
pub fn apply_timescale(hit_objects: &mut [HitObject], scale: f64) {
    for hit_object in hit_objects {
        hit_object.time *= scale;
    }
}
