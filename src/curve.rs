use std::f64::consts::PI;

use crate::arena::Arena;
use crate::pos2::Pos2;

pub(crate) const BEZIER_TOLERANCE: f32 = 0.25;

/// Pieces per control point pair of a Catmull-Rom chain.
const CATMULL_DETAIL: usize = 50;

/// Circles are approximated by linear segments within this tolerance,
/// which makes the overall path slightly shorter than the true arc.
const CIRCULAR_ARC_TOLERANCE: f32 = 0.1;

/// The curve type tag of a slider path segment.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum SegmentKind {
    Bezier,
    Catmull,
    Linear,
    PerfectCircle,
}

impl SegmentKind {
    pub(crate) fn from_tag(s: &str) -> Option<Self> {
        match s {
            "B" => Some(Self::Bezier),
            "C" => Some(Self::Catmull),
            "L" => Some(Self::Linear),
            "P" => Some(Self::PerfectCircle),
            _ => None,
        }
    }
}

/// Append the polyline of one segment to `path`.
///
/// PerfectCircle segments that have no valid circumscribed circle render
/// as a straight line when their three points are collinear, and as a
/// generic bezier otherwise.
pub(crate) fn append_segment(
    path: &mut Vec<Pos2>,
    kind: SegmentKind,
    points: &[Pos2],
    arena: &Arena<Pos2>,
) {
    match kind {
        SegmentKind::Bezier => append_bezier(path, points, arena),
        SegmentKind::Catmull => append_catmull(path, points),
        SegmentKind::Linear => append_linear(path, points),
        SegmentKind::PerfectCircle => match CircularArc::from_control_points(points) {
            Some(arc) => arc.approximate(path),
            None if points.len() == 3 => append_linear(path, points),
            None => append_bezier(path, points, arena),
        },
    }
}

/// Piecewise-linear approximation of a bezier curve by adaptively
/// subdividing the control points until the approximation error vanishes
/// below [`BEZIER_TOLERANCE`].
///
/// A run of identical adjacent control points splits the curve at that
/// point, a "red anchor" in editor terms.
pub(crate) fn append_bezier(path: &mut Vec<Pos2>, points: &[Pos2], arena: &Arena<Pos2>) {
    if points.is_empty() {
        return;
    }

    let mut start = 0;

    for i in 1..points.len() {
        if points[i] == points[i - 1] {
            bezier_run(path, &points[start..i], arena);
            start = i;
        }
    }

    bezier_run(path, &points[start..], arena);
}

fn bezier_run(output: &mut Vec<Pos2>, points: &[Pos2], arena: &Arena<Pos2>) {
    let Some(degree) = points.len().checked_sub(1) else {
        return;
    };

    // Emulates recursion with an explicit stack: a depth-first refinement
    // over the subdivision tree. Scratch windows come out of the arena so
    // no allocation happens per subdivision.
    let mut to_flatten: Vec<&mut [Pos2]> = Vec::new();
    let mut free_buffers: Vec<&mut [Pos2]> = Vec::new();

    let input = arena.take(points.len());
    input.copy_from_slice(points);
    to_flatten.push(input);

    let midpoints = arena.take(degree + 1);
    let left_scratch = arena.take(degree * 2 + 1);
    let right_scratch = arena.take(degree + 1);

    while let Some(parent) = to_flatten.pop() {
        if bezier_is_flat_enough(parent) {
            // Flat enough: an extension of De Casteljau's algorithm yields
            // a piecewise-linear approximation with as many points as
            // there are control points.
            bezier_approximate(parent, output, left_scratch, right_scratch, midpoints);
            free_buffers.push(parent);

            continue;
        }

        let right = free_buffers
            .pop()
            .unwrap_or_else(|| arena.take(degree + 1));

        bezier_subdivide(parent, left_scratch, right, midpoints);

        // the parent buffer is reused for the left child
        parent.copy_from_slice(&left_scratch[..degree + 1]);

        to_flatten.push(right);
        to_flatten.push(parent);
    }

    output.push(points[degree]);
}

/// Whether the 2nd order finite difference, i.e. the local curvature, is
/// within tolerable bounds everywhere.
fn bezier_is_flat_enough(points: &[Pos2]) -> bool {
    const BOUND: f32 = 4.0 * BEZIER_TOLERANCE * BEZIER_TOLERANCE;

    points
        .windows(3)
        .all(|w| (w[0] - w[1] * 2.0 + w[2]).length_squared() <= BOUND)
}

/// Split `points` into two halves that describe the same curve when
/// pieced back together.
fn bezier_subdivide(points: &[Pos2], l: &mut [Pos2], r: &mut [Pos2], midpoints: &mut [Pos2]) {
    let count = points.len();
    midpoints[..count].copy_from_slice(points);

    for i in 0..count {
        l[i] = midpoints[0];
        r[count - i - 1] = midpoints[count - i - 1];

        for j in 0..count - i - 1 {
            midpoints[j] = (midpoints[j] + midpoints[j + 1]) * 0.5;
        }
    }
}

fn bezier_approximate(
    points: &[Pos2],
    output: &mut Vec<Pos2>,
    l: &mut [Pos2],
    r: &mut [Pos2],
    midpoints: &mut [Pos2],
) {
    let count = points.len();

    bezier_subdivide(points, l, r, midpoints);

    for i in 0..count - 1 {
        l[count + i] = r[i + 1];
    }

    output.push(points[0]);

    for i in 1..count - 1 {
        let idx = 2 * i;
        output.push((l[idx - 1] + l[idx] * 2.0 + l[idx + 1]) * 0.25);
    }
}

/// Piecewise-linear approximation of a Catmull-Rom spline with mirror
/// extrapolation at the endpoints.
pub(crate) fn append_catmull(path: &mut Vec<Pos2>, points: &[Pos2]) {
    if points.is_empty() {
        return;
    }

    path.reserve((points.len() - 1) * CATMULL_DETAIL * 2);

    for i in 0..points.len() - 1 {
        let v1 = points[i.saturating_sub(1)];
        let v2 = points[i];

        let v3 = if i < points.len() - 1 {
            points[i + 1]
        } else {
            v2 * 2.0 - v1
        };

        let v4 = if i < points.len() - 2 {
            points[i + 2]
        } else {
            v3 * 2.0 - v2
        };

        for c in 0..CATMULL_DETAIL {
            path.push(catmull_point(v1, v2, v3, v4, c as f32 / CATMULL_DETAIL as f32));
            path.push(catmull_point(
                v1,
                v2,
                v3,
                v4,
                (c + 1) as f32 / CATMULL_DETAIL as f32,
            ));
        }
    }
}

fn catmull_point(v1: Pos2, v2: Pos2, v3: Pos2, v4: Pos2, t: f32) -> Pos2 {
    fn component(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
        0.5 * (2.0 * p1
            + (-p0 + p2) * t
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t * t
            + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t * t * t)
    }

    Pos2 {
        x: component(v1.x, v2.x, v3.x, v4.x, t),
        y: component(v1.y, v2.y, v3.y, v4.y, t),
    }
}

/// Straight segments: the control points are the polyline.
pub(crate) fn append_linear(path: &mut Vec<Pos2>, points: &[Pos2]) {
    path.extend_from_slice(points);
}

/// The circumscribed circle through three slider control points.
#[derive(Clone, Debug)]
pub(crate) struct CircularArc {
    centre: Pos2,
    radius: f32,
    theta_start: f64,
    theta_range: f64,
    direction: f64,
    length_to_angle: f64,
    amount_points: i32,
}

impl CircularArc {
    /// `None` unless `points` are exactly three points spanning a
    /// non-degenerate triangle.
    pub(crate) fn from_control_points(points: &[Pos2]) -> Option<Self> {
        let &[a, b, c] = points else {
            return None;
        };

        // A side length of almost zero makes the circumscription
        // numerically unstable; the caller falls back to a bezier.
        if ((b.y - a.y) * (c.x - a.x) - (b.x - a.x) * (c.y - a.y)).abs() < 1e-3 {
            return None;
        }

        // https://en.wikipedia.org/wiki/Circumscribed_circle#Cartesian_coordinates_2
        let d = 2.0 * (a.x * (b - c).y + b.x * (c - a).y + c.x * (a - b).y);
        let a_sq = a.length_squared();
        let b_sq = b.length_squared();
        let c_sq = c.length_squared();

        let centre = Pos2 {
            x: a_sq * (b - c).y + b_sq * (c - a).y + c_sq * (a - b).y,
            y: a_sq * (c - b).x + b_sq * (a - c).x + c_sq * (b - a).x,
        } / d;

        let da = a - centre;
        let dc = c - centre;

        let radius = da.length();
        let theta_start = f64::from(da.y).atan2(f64::from(da.x));
        let mut theta_end = f64::from(dc.y).atan2(f64::from(dc.x));

        while theta_end < theta_start {
            theta_end += 2.0 * PI;
        }

        let mut direction = 1.0;
        let mut theta_range = theta_end - theta_start;

        // Sweep direction depends on which side of AC the point B lies.
        let vec_ac = c - a;
        let ortho_ac = Pos2 {
            x: vec_ac.y,
            y: -vec_ac.x,
        };

        if ortho_ac.dot(b - a) < 0.0 {
            direction = -1.0;
            theta_range = 2.0 * PI - theta_range;
        }

        let mut length_to_angle = direction / f64::from(radius);

        let amount_points = if CIRCULAR_ARC_TOLERANCE < 2.0 * radius {
            let count =
                theta_range / (2.0 * f64::from(1.0 - CIRCULAR_ARC_TOLERANCE / radius).acos());

            (count.ceil() as i32).max(2)
        } else {
            2
        };

        let alpha = theta_range / (2.0 * f64::from(amount_points - 1));
        length_to_angle *= alpha / alpha.sin();

        Some(Self {
            centre,
            radius,
            theta_start,
            theta_range,
            direction,
            length_to_angle,
            amount_points,
        })
    }

    /// Append evenly spaced samples of the arc to `out`.
    pub(crate) fn approximate(&self, out: &mut Vec<Pos2>) {
        out.reserve(self.amount_points as usize);

        for i in 0..self.amount_points {
            let fract = f64::from(i) / f64::from(self.amount_points - 1);
            let theta = self.theta_start + self.direction * fract * self.theta_range;
            out.push(self.position_at_theta(theta));
        }
    }

    /// Position at an arc length from the start, interpolated between the
    /// samples [`CircularArc::approximate`] would emit.
    pub(crate) fn position_at_distance(&self, distance: f64) -> Pos2 {
        let theta = distance * self.length_to_angle;
        let theta_inc = self.direction * self.theta_range / f64::from(self.amount_points - 1);

        let theta_0 =
            theta_inc * (theta / theta_inc).floor().min(f64::from(self.amount_points - 2));
        let theta_1 = theta_0 + theta_inc;
        let t = (theta - theta_0) / theta_inc;

        let p0 = self.position_at_theta(self.theta_start + theta_0);
        let p1 = self.position_at_theta(self.theta_start + theta_1);

        Pos2::lerp(p0, p1, t as f32)
    }

    fn position_at_theta(&self, theta: f64) -> Pos2 {
        self.centre
            + Pos2 {
                x: theta.cos() as f32,
                y: theta.sin() as f32,
            } * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polyline_length(path: &[Pos2]) -> f32 {
        path.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    #[test]
    fn bezier_stays_flat() {
        let points = [
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 200.0),
            Pos2::new(200.0, -200.0),
            Pos2::new(300.0, 0.0),
        ];

        let arena = Arena::new();
        let mut path = Vec::new();
        append_bezier(&mut path, &points, &arena);

        assert!(path.len() > 4);
        assert_eq!(path[0], points[0]);
        assert_eq!(*path.last().unwrap(), points[3]);

        // interpolation headroom on top of the subdivision bound
        let bound = 2.0 * BEZIER_TOLERANCE + 0.5;

        for w in path.windows(3) {
            assert!((w[0] - w[1] * 2.0 + w[2]).length() <= bound);
        }
    }

    #[test]
    fn bezier_red_anchor_passes_through_repeated_point() {
        let points = [
            Pos2::new(0.0, 0.0),
            Pos2::new(50.0, 100.0),
            Pos2::new(100.0, 0.0),
            Pos2::new(100.0, 0.0),
            Pos2::new(150.0, -100.0),
            Pos2::new(200.0, 0.0),
        ];

        let arena = Arena::new();
        let mut path = Vec::new();
        append_bezier(&mut path, &points, &arena);

        assert!(path.contains(&Pos2::new(100.0, 0.0)));
        assert_eq!(*path.last().unwrap(), points[5]);
    }

    #[test]
    fn circular_arc_through_three_points() {
        let points = [
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 100.0),
            Pos2::new(200.0, 0.0),
        ];

        let arc = CircularArc::from_control_points(&points).unwrap();
        let mut path = Vec::new();
        arc.approximate(&mut path);

        assert!(path.len() >= 2);
        assert!(path[0].distance(points[0]) < 1e-3);
        assert!(path.last().unwrap().distance(points[2]) < 1e-3);

        // every sample sits on the circle around (100, 0) with radius 100
        for point in &path {
            let radius = point.distance(Pos2::new(100.0, 0.0));
            assert!((radius - 100.0).abs() < 1e-3);
        }

        // a half circle of radius 100 measures close to its true length
        let length = polyline_length(&path);
        assert!((f64::from(length) - 100.0 * PI).abs() < 1.0);
    }

    #[test]
    fn collinear_points_have_no_circle() {
        let points = [
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 0.0),
            Pos2::new(200.0, 0.0),
        ];

        assert!(CircularArc::from_control_points(&points).is_none());

        let arena = Arena::new();
        let mut path = Vec::new();
        append_segment(&mut path, SegmentKind::PerfectCircle, &points, &arena);

        assert_eq!(path, points);
    }

    #[test]
    fn four_points_have_no_circle() {
        let points = [
            Pos2::new(0.0, 0.0),
            Pos2::new(50.0, 50.0),
            Pos2::new(100.0, 0.0),
            Pos2::new(150.0, 50.0),
        ];

        assert!(CircularArc::from_control_points(&points).is_none());
    }

    #[test]
    fn catmull_piece_count() {
        let points = [
            Pos2::new(0.0, 0.0),
            Pos2::new(100.0, 50.0),
            Pos2::new(200.0, 0.0),
        ];

        let mut path = Vec::new();
        append_catmull(&mut path, &points);

        assert_eq!(path.len(), (points.len() - 1) * CATMULL_DETAIL * 2);
        assert_eq!(path[0], points[0]);
        assert!(path.last().unwrap().distance(points[2]) < 1e-3);
    }
}
