//! Low-level drawing helpers shared by the composer: unit conversion,
//! approximate Helvetica metrics, hex colors, and rounded-rectangle paths.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{Color, Mm, Point, Polygon, Rgb};

/// Cubic bezier circle constant for quarter-arc corners.
const BEZIER_ARC: f32 = 0.552_284_8;

/// Convert PDF points to printpdf millimetres.
pub fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Convert a top-origin y coordinate (points) to printpdf's bottom-origin Mm.
pub fn y_from_top(page_height: f32, y_top: f32) -> Mm {
    pt_to_mm(page_height - y_top)
}

/// Baseline position for text whose top edge sits at `y_top`.
pub fn baseline(y_top: f32, font_size: f32) -> f32 {
    y_top + font_size * 0.8
}

/// Approximate rendered width of Helvetica text, in points.
///
/// Good enough for legend advancement and caption centering; the layout
/// only needs the estimate to be deterministic and roughly proportional.
pub fn approx_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Parse a `#RRGGBB` hex color into a printpdf fill color.
/// Unparseable input yields mid-grey rather than failing the report.
pub fn hex_color(hex: &str) -> Color {
    let (r, g, b) = parse_hex(hex).unwrap_or((0x77, 0x77, 0x77));
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

pub fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

pub fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let s = hex.strip_prefix('#')?;
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Build a rounded-rectangle polygon from top-origin point coordinates.
///
/// `mode` selects fill (caption pills) or clip (panel image bounds). Corners
/// are quarter-circle cubic beziers; control points are flagged `true` per
/// the printpdf point convention.
pub fn rounded_rect(
    x: f32,
    y_top: f32,
    w: f32,
    h: f32,
    r: f32,
    page_height: f32,
    mode: PaintMode,
) -> Polygon {
    let top = page_height - y_top;
    let bottom = page_height - y_top - h;
    let k = BEZIER_ARC * r;

    let pt = |px: f32, py: f32| Point::new(pt_to_mm(px), pt_to_mm(py));

    let ring = vec![
        // Top edge, left to right
        (pt(x + r, top), false),
        (pt(x + w - r, top), false),
        // Top-right corner
        (pt(x + w - r + k, top), true),
        (pt(x + w, top - r + k), true),
        (pt(x + w, top - r), false),
        // Right edge
        (pt(x + w, bottom + r), false),
        // Bottom-right corner
        (pt(x + w, bottom + r - k), true),
        (pt(x + w - r + k, bottom), true),
        (pt(x + w - r, bottom), false),
        // Bottom edge
        (pt(x + r, bottom), false),
        // Bottom-left corner
        (pt(x + r - k, bottom), true),
        (pt(x, bottom + r - k), true),
        (pt(x, bottom + r), false),
        // Left edge
        (pt(x, top - r), false),
        // Top-left corner
        (pt(x, top - r + k), true),
        (pt(x + r - k, top), true),
        (pt(x + r, top), false),
    ];

    Polygon {
        rings: vec![ring],
        mode,
        winding_order: WindingOrder::NonZero,
    }
}

/// Simple word-wrap helper for recommendation text rendering.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
