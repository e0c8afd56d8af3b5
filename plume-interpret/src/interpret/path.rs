//! The in-flight path.

use crate::FillRule;
use kurbo::{BezPath, Point};
use log::warn;

/// Accumulates the current path between painting operators.
///
/// The winding rule is authoritative only at commit time: a taken path
/// leaves a fresh builder behind with the default non-zero rule.
#[derive(Debug)]
pub(crate) struct PathBuilder {
    path: BezPath,
    fill_rule: FillRule,
    last_point: Point,
    sub_path_start: Point,
}

impl PathBuilder {
    pub(crate) fn new() -> Self {
        Self {
            path: BezPath::new(),
            fill_rule: FillRule::NonZero,
            last_point: Point::ZERO,
            sub_path_start: Point::ZERO,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    pub(crate) fn move_to(&mut self, x: f32, y: f32) {
        let p = Point::new(f64::from(x), f64::from(y));
        self.last_point = p;
        self.sub_path_start = p;
        self.path.move_to(p);
    }

    pub(crate) fn line_to(&mut self, x: f32, y: f32) {
        if self.path.elements().is_empty() {
            warn!("lineto without a current point");
            return;
        }

        let p = Point::new(f64::from(x), f64::from(y));
        self.last_point = p;
        self.path.line_to(p);
    }

    /// Cubic curve with both control points given (`c`).
    pub(crate) fn curve_to(&mut self, coords: &[f32]) {
        if self.path.elements().is_empty() {
            warn!("curveto without a current point");
            return;
        }

        let p1 = Point::new(f64::from(coords[0]), f64::from(coords[1]));
        let p2 = Point::new(f64::from(coords[2]), f64::from(coords[3]));
        let p3 = Point::new(f64::from(coords[4]), f64::from(coords[5]));
        self.last_point = p3;
        self.path.curve_to(p1, p2, p3);
    }

    /// Cubic curve whose first control point is the current point (`v`).
    pub(crate) fn curve_from_current(&mut self, coords: &[f32]) {
        if self.path.elements().is_empty() {
            warn!("curveto without a current point");
            return;
        }

        let p1 = self.last_point;
        let p2 = Point::new(f64::from(coords[0]), f64::from(coords[1]));
        let p3 = Point::new(f64::from(coords[2]), f64::from(coords[3]));
        self.last_point = p3;
        self.path.curve_to(p1, p2, p3);
    }

    /// Cubic curve whose second control point is the endpoint (`y`).
    pub(crate) fn curve_to_endpoint(&mut self, coords: &[f32]) {
        if self.path.elements().is_empty() {
            warn!("curveto without a current point");
            return;
        }

        let p1 = Point::new(f64::from(coords[0]), f64::from(coords[1]));
        let p2 = Point::new(f64::from(coords[2]), f64::from(coords[3]));
        self.last_point = p2;
        self.path.curve_to(p1, p2, p2);
    }

    /// Close the current subpath (`h`).
    pub(crate) fn close(&mut self) {
        if self.path.elements().is_empty() {
            return;
        }

        self.path.close_path();
        self.last_point = self.sub_path_start;
    }

    /// Append a closed rectangle as a four-line subpath (`re`).
    pub(crate) fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close();
    }

    /// Switch the pending commit to the even-odd rule (`f*`, `B*`, `b*`,
    /// `W*`).
    pub(crate) fn set_even_odd(&mut self) {
        self.fill_rule = FillRule::EvenOdd;
    }

    /// Take the accumulated path and its winding rule, leaving an empty
    /// builder with the default rule behind.
    pub(crate) fn take(&mut self) -> (BezPath, FillRule) {
        let path = std::mem::take(&mut self.path);
        let fill_rule = self.fill_rule;

        self.fill_rule = FillRule::NonZero;
        self.last_point = Point::ZERO;
        self.sub_path_start = Point::ZERO;

        (path, fill_rule)
    }
}
