// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{PathItem, SvgPath};

// Keep in sync with the largest allowed precision.
const POW_VEC: &[f64] = &[
    1.0,
    10.0,
    100.0,
    1_000.0,
    10_000.0,
    100_000.0,
    1_000_000.0,
    10_000_000.0,
    100_000_000.0,
];

pub fn write(path: &SvgPath, precision: u8) -> String {
    let precision = (precision as usize).min(POW_VEC.len() - 1) as u8;
    let mut out = String::new();
    // The command implied by the SVG grammar if the next item
    // were written without a letter.
    let mut implicit: Option<char> = None;

    for item in path.items() {
        let (cmd, args) = split(item);
        if implicit == Some(cmd) {
            // `L` pairs after `M` and repeated commands can continue
            // without the letter.
            for n in &args {
                write_num(*n, precision, &mut out, true);
            }
        } else {
            out.push(cmd);
            for (i, n) in args.iter().enumerate() {
                write_num(*n, precision, &mut out, i > 0);
            }
        }

        implicit = match cmd {
            'M' => Some('L'),
            'm' => Some('l'),
            'Z' | 'z' => None,
            _ => Some(cmd),
        };
    }

    out
}

fn split(item: &PathItem) -> (char, Vec<f64>) {
    match *item {
        PathItem::MoveTo { abs, x, y } => (letter('m', abs), vec![x, y]),
        PathItem::LineTo { abs, x, y } => (letter('l', abs), vec![x, y]),
        PathItem::HorizontalLineTo { abs, x } => (letter('h', abs), vec![x]),
        PathItem::VerticalLineTo { abs, y } => (letter('v', abs), vec![y]),
        PathItem::CurveTo {
            abs,
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        } => (letter('c', abs), vec![x1, y1, x2, y2, x, y]),
        PathItem::SmoothCurveTo { abs, x2, y2, x, y } => (letter('s', abs), vec![x2, y2, x, y]),
        PathItem::Quadratic { abs, x1, y1, x, y } => (letter('q', abs), vec![x1, y1, x, y]),
        PathItem::SmoothQuadratic { abs, x, y } => (letter('t', abs), vec![x, y]),
        PathItem::EllipticalArc {
            abs,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
        } => (
            letter('a', abs),
            vec![
                rx,
                ry,
                x_axis_rotation,
                if large_arc { 1.0 } else { 0.0 },
                if sweep { 1.0 } else { 0.0 },
                x,
                y,
            ],
        ),
        PathItem::ClosePath { abs } => (letter('z', abs), Vec::new()),
    }
}

#[inline]
fn letter(lower: char, abs: bool) -> char {
    if abs {
        lower.to_ascii_uppercase()
    } else {
        lower
    }
}

// Writes a rounded number, preceded by a space only when required
// by the SVG grammar. A number starting with `-` or `.` separates itself.
fn write_num(num: f64, precision: u8, out: &mut String, separated: bool) {
    let pow = POW_VEC[precision as usize];
    let mut v = (num * pow).round() / pow;
    if v == 0.0 {
        // Avoid writing `-0`.
        v = 0.0;
    }

    let s = if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let mut s = format!("{:.*}", precision as usize, v);
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        if let Some(rest) = s.strip_prefix("0.") {
            s = format!(".{}", rest);
        } else if let Some(rest) = s.strip_prefix("-0.") {
            s = format!("-.{}", rest);
        }
        s
    };

    let needs_space = separated && !s.starts_with('-') && !s.starts_with('.');
    if needs_space && !out.is_empty() {
        out.push(' ');
    }

    out.push_str(&s);
}
