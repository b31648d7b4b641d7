//! Minimal content-stream interpreter.
//!
//! Tracks just enough graphics state (CTM, fill/stroke color, current path,
//! text matrices) to recover painted vector paths with their colors and the
//! point where each text-show operator starts. Form XObjects and shading
//! operators are not followed.

use std::ops::Range;

use lopdf::content::Operation;
use lopdf::Object;

use crate::core::color::Rgb;
use crate::core::geometry::{LineSegment, Rect};
use crate::core::model::PathObject;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m` applied first, then `n`.
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

pub(crate) fn operand_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Option<Vec<f64>> {
    operands.iter().map(operand_f64).collect()
}

fn fixed<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    let values = numbers(operands)?;
    values.try_into().ok()
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    fixed::<6>(operands)
}

/// Maps PDF user space (origin bottom-left) to page space (origin top-left).
#[derive(Debug, Clone, Copy)]
pub struct PageSpace {
    pub origin_x: f64,
    pub top: f64,
}

impl PageSpace {
    pub fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.origin_x, self.top - y)
    }

    pub fn to_user(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.origin_x, self.top - y)
    }
}

/// A painted path and the operations that built and painted it.
#[derive(Debug, Clone)]
pub struct PaintedPath {
    pub ops: Range<usize>,
    pub object: PathObject,
    pub clipping: bool,
}

/// Where a text-show operation starts on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextShow {
    pub op: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub paths: Vec<PaintedPath>,
    pub texts: Vec<TextShow>,
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            fill: Some(Rgb::gray(0.0)),
            stroke: Some(Rgb::gray(0.0)),
        }
    }
}

#[derive(Debug, Default)]
struct PathBuilder {
    start_op: usize,
    bbox: Option<Rect>,
    segments: Vec<LineSegment>,
    current: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    clipping: bool,
}

impl PathBuilder {
    fn include(&mut self, point: (f64, f64)) {
        self.bbox = Some(match self.bbox {
            Some(bbox) => bbox.include_point(point.0, point.1),
            None => Rect::new(point.0, point.1, point.0, point.1),
        });
    }

    fn move_to(&mut self, point: (f64, f64)) {
        self.include(point);
        self.current = Some(point);
        self.subpath_start = Some(point);
    }

    fn line_to(&mut self, point: (f64, f64)) {
        self.include(point);
        if let Some(from) = self.current {
            self.segments
                .push(LineSegment::new(from.0, from.1, point.0, point.1));
        }
        self.current = Some(point);
    }

    fn curve_to(&mut self, points: &[(f64, f64)]) {
        for point in points {
            self.include(*point);
        }
        self.current = points.last().copied().or(self.current);
    }

    fn close(&mut self) {
        if let (Some(from), Some(to)) = (self.current, self.subpath_start) {
            if from != to {
                self.segments.push(LineSegment::new(from.0, from.1, to.0, to.1));
            }
            self.current = Some(to);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    tm: Matrix,
    tlm: Matrix,
    leading: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            tm: IDENTITY,
            tlm: IDENTITY,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }
}

struct Interpreter {
    space: PageSpace,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: Option<PathBuilder>,
    text: TextState,
    scan: PageScan,
}

impl Interpreter {
    fn new(space: PageSpace) -> Self {
        Self {
            space,
            state: GraphicsState::default(),
            stack: Vec::new(),
            path: None,
            text: TextState::default(),
            scan: PageScan::default(),
        }
    }

    fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = apply(&self.state.ctm, x, y);
        self.space.to_page(dx, dy)
    }

    fn path_mut(&mut self, op: usize) -> &mut PathBuilder {
        self.path.get_or_insert_with(|| PathBuilder {
            start_op: op,
            ..PathBuilder::default()
        })
    }

    fn points(&self, values: &[f64]) -> Vec<(f64, f64)> {
        values
            .chunks_exact(2)
            .map(|pair| self.to_page(pair[0], pair[1]))
            .collect()
    }

    fn paint(&mut self, op: usize, operator: &str) {
        let Some(mut path) = self.path.take() else {
            return;
        };
        if matches!(operator, "s" | "b" | "b*") {
            path.close();
        }
        let fills = matches!(operator, "f" | "F" | "f*" | "B" | "B*" | "b" | "b*");
        let strokes = matches!(operator, "S" | "s" | "B" | "B*" | "b" | "b*");
        if !fills && !strokes {
            return;
        }
        let Some(bbox) = path.bbox else {
            return;
        };
        self.scan.paths.push(PaintedPath {
            ops: path.start_op..op + 1,
            object: PathObject {
                bbox,
                fill: if fills { self.state.fill } else { None },
                stroke: if strokes { self.state.stroke } else { None },
                segments: if strokes { path.segments } else { Vec::new() },
            },
            clipping: path.clipping,
        });
    }

    fn show_text(&mut self, op: usize) {
        let origin = multiply(&self.text.tm, &self.state.ctm);
        let (x, y) = self.space.to_page(origin[4], origin[5]);
        self.scan.texts.push(TextShow { op, x, y });
    }

    fn color_operands(operands: &[Object]) -> Option<Rgb> {
        numbers(operands).and_then(|values| Rgb::from_components(&values))
    }

    fn color_space(operands: &[Object]) -> Option<Rgb> {
        match operands.first().and_then(|o| o.as_name().ok()) {
            Some(b"Pattern") => None,
            _ => Some(Rgb::gray(0.0)),
        }
    }

    fn step(&mut self, idx: usize, operation: &Operation) {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => self.stack.push(self.state),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "g" | "rg" | "k" | "sc" | "scn" => self.state.fill = Self::color_operands(operands),
            "G" | "RG" | "K" | "SC" | "SCN" => self.state.stroke = Self::color_operands(operands),
            "cs" => self.state.fill = Self::color_space(operands),
            "CS" => self.state.stroke = Self::color_space(operands),
            "m" => {
                if let Some([x, y]) = fixed::<2>(operands) {
                    let point = self.to_page(x, y);
                    self.path_mut(idx).move_to(point);
                }
            }
            "l" => {
                if let Some([x, y]) = fixed::<2>(operands) {
                    let point = self.to_page(x, y);
                    self.path_mut(idx).line_to(point);
                }
            }
            "c" | "v" | "y" => {
                if let Some(values) = numbers(operands) {
                    let points = self.points(&values);
                    self.path_mut(idx).curve_to(&points);
                }
            }
            "h" => {
                if let Some(path) = self.path.as_mut() {
                    path.close();
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = fixed::<4>(operands) {
                    let corners = [
                        self.to_page(x, y),
                        self.to_page(x + w, y),
                        self.to_page(x + w, y + h),
                        self.to_page(x, y + h),
                    ];
                    let path = self.path_mut(idx);
                    path.move_to(corners[0]);
                    for corner in &corners[1..] {
                        path.line_to(*corner);
                    }
                    path.close();
                }
            }
            "W" | "W*" => {
                if let Some(path) = self.path.as_mut() {
                    path.clipping = true;
                }
            }
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" | "n" => {
                self.paint(idx, operation.operator.as_str())
            }
            "BT" => self.text = TextState {
                leading: self.text.leading,
                ..TextState::default()
            },
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.text.tm = m;
                    self.text.tlm = m;
                }
            }
            "Td" | "TD" => {
                if let Some([tx, ty]) = fixed::<2>(operands) {
                    if operation.operator == "TD" {
                        self.text.leading = -ty;
                    }
                    self.text.next_line(tx, ty);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(operand_f64) {
                    self.text.leading = leading;
                }
            }
            "T*" => self.text.next_line(0.0, -self.text.leading),
            "'" | "\"" => {
                self.text.next_line(0.0, -self.text.leading);
                self.show_text(idx);
            }
            "Tj" | "TJ" => self.show_text(idx),
            _ => {}
        }
    }
}

/// Interprets `operations` and reports painted paths and text origins in
/// page space.
pub fn scan_operations(operations: &[Operation], space: PageSpace) -> PageScan {
    let mut interpreter = Interpreter::new(space);
    for (idx, operation) in operations.iter().enumerate() {
        interpreter.step(idx, operation);
    }
    interpreter.scan
}
