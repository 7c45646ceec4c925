//! # Text Layout
//!
//! Fits a string into an element box under one of four overflow policies:
//!
//! | Policy | Lines | Font size | Box height |
//! |--------|-------|-----------|------------|
//! | wrap | greedy word wrap | fixed | may overflow |
//! | truncate | one, cut to fit | fixed | ignored |
//! | ellipsis | one, cut to fit with `…` | fixed | ignored |
//! | resize-down | greedy word wrap | shrunk until it fits | respected |
//!
//! Everything here is pure: layout only calls [`FontFace::measure`] and
//! [`FontFace::line_height`], so it never disturbs a drawing context. The
//! caller must draw with the same face and size it laid out with.

use crate::document::ElementOverflow;
use crate::font::FontFace;

/// Marker appended by the ellipsis policy.
pub const ELLIPSIS: &str = "\u{2026}";

/// Floor for resize-down.
pub const DEFAULT_MIN_FONT_SIZE: f32 = 1.0;

/// Granularity of the resize-down search.
const SIZE_STEP: f32 = 0.5;

/// Output of a layout pass, consumed once by the draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    /// Size the lines were measured at (differs from the request only for
    /// resize-down).
    pub font_size: f32,
    pub line_height: f32,
    /// Characters were dropped to make the text fit.
    pub truncated: bool,
    /// Lines still exceed the box (a word wider than the box, or wrapped
    /// text taller than the box).
    pub overflows: bool,
}

impl TextLayout {
    /// Total height of the laid-out block.
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    /// Width of the widest line.
    pub fn width(&self, face: &dyn FontFace) -> f32 {
        self.lines
            .iter()
            .map(|line| face.measure(line, self.font_size))
            .fold(0.0, f32::max)
    }
}

/// Everything a layout pass needs besides the face.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub text: &'a str,
    pub max_width: f32,
    /// Only resize-down looks at the height.
    pub max_height: Option<f32>,
    pub font_size: f32,
    pub overflow: ElementOverflow,
    pub min_font_size: f32,
}

/// Lay out `request.text` with the policy it asks for.
pub fn layout_text(face: &dyn FontFace, request: &LayoutRequest<'_>) -> TextLayout {
    let LayoutRequest {
        text,
        max_width,
        max_height,
        font_size,
        overflow,
        min_font_size,
    } = *request;
    match overflow {
        ElementOverflow::Wrap => layout_wrap(face, text, font_size, max_width),
        ElementOverflow::Truncate => layout_truncate(face, text, font_size, max_width),
        ElementOverflow::Ellipsis => layout_ellipsis(face, text, font_size, max_width),
        ElementOverflow::ResizeDown => {
            layout_resize_down(face, text, font_size, max_width, max_height, min_font_size)
        }
    }
}

/// Greedy word wrap. Explicit newlines start a new paragraph; a word wider
/// than `max_width` gets a line of its own rather than being split.
pub fn layout_wrap(face: &dyn FontFace, text: &str, font_size: f32, max_width: f32) -> TextLayout {
    let mut lines = Vec::new();
    let mut overflows = false;

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate_width = face.measure(&current, font_size)
                + face.measure(" ", font_size)
                + face.measure(word, font_size);
            let candidate = format!("{} {}", current, word);
            // Measure the joined string when kerning could differ from the sum.
            let fits = candidate_width <= max_width && face.measure(&candidate, font_size) <= max_width;
            if fits {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }

    for line in &lines {
        if face.measure(line, font_size) > max_width {
            overflows = true;
        }
    }

    TextLayout {
        lines,
        font_size,
        line_height: face.line_height(font_size),
        truncated: false,
        overflows,
    }
}

/// Single line with newlines flattened to spaces.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Byte offsets of every char boundary, including the end of the string.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Longest prefix (by char count) for which `fits` holds, by binary search.
///
/// Assumes `fits` is monotonic: if a prefix fits, every shorter one does.
fn longest_fitting_prefix<'t>(text: &'t str, fits: impl Fn(&str) -> bool) -> &'t str {
    let boundaries = char_boundaries(text);
    // Invariant: prefix ending at boundaries[lo] fits; boundaries[hi + 1..] do not.
    let mut lo = 0usize;
    let mut hi = boundaries.len() - 1;
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(&text[..boundaries[mid]]) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    &text[..boundaries[lo]]
}

/// One line, cut to the longest prefix that fits; no marker.
pub fn layout_truncate(face: &dyn FontFace, text: &str, font_size: f32, max_width: f32) -> TextLayout {
    let line = single_line(text);
    let (line, truncated) = if face.measure(&line, font_size) <= max_width {
        (line, false)
    } else {
        let prefix = longest_fitting_prefix(&line, |p| face.measure(p, font_size) <= max_width);
        (prefix.to_string(), true)
    };

    TextLayout {
        lines: vec![line],
        font_size,
        line_height: face.line_height(font_size),
        truncated,
        overflows: false,
    }
}

/// One line, cut so that the prefix plus [`ELLIPSIS`] fits.
///
/// When not even the marker fits, the line is left empty.
pub fn layout_ellipsis(face: &dyn FontFace, text: &str, font_size: f32, max_width: f32) -> TextLayout {
    let line = single_line(text);
    let line_height = face.line_height(font_size);

    if face.measure(&line, font_size) <= max_width {
        return TextLayout {
            lines: vec![line],
            font_size,
            line_height,
            truncated: false,
            overflows: false,
        };
    }

    let with_marker = |prefix: &str| format!("{}{}", prefix, ELLIPSIS);
    let fitted = if face.measure(ELLIPSIS, font_size) > max_width {
        String::new()
    } else {
        let prefix = longest_fitting_prefix(&line, |p| {
            face.measure(&with_marker(p), font_size) <= max_width
        });
        let trimmed = prefix.trim_end();
        if face.measure(&with_marker(trimmed), font_size) <= max_width {
            with_marker(trimmed)
        } else {
            with_marker(prefix)
        }
    };

    TextLayout {
        lines: vec![fitted],
        font_size,
        line_height,
        truncated: true,
        overflows: false,
    }
}

fn wrap_fits(layout: &TextLayout, face: &dyn FontFace, max_width: f32, max_height: Option<f32>) -> bool {
    let fits_height = max_height.is_none_or(|h| layout.height() <= h);
    fits_height
        && layout
            .lines
            .iter()
            .all(|line| face.measure(line, layout.font_size) <= max_width)
}

/// Word wrap at the largest size (in half-pixel steps, no larger than
/// `font_size` and no smaller than `min_font_size`) at which every line fits
/// `max_width` and the block fits `max_height`.
///
/// Text that already fits keeps its declared size, so running this again at
/// the returned size never shrinks further.
pub fn layout_resize_down(
    face: &dyn FontFace,
    text: &str,
    font_size: f32,
    max_width: f32,
    max_height: Option<f32>,
    min_font_size: f32,
) -> TextLayout {
    let at = |size: f32| {
        let mut layout = layout_wrap(face, text, size, max_width);
        layout.overflows = !wrap_fits(&layout, face, max_width, max_height);
        layout
    };

    let declared = at(font_size);
    if !declared.overflows || font_size <= min_font_size {
        return declared;
    }

    // Candidate sizes are k * SIZE_STEP for k in [lo, hi], all below font_size.
    let lo = (min_font_size / SIZE_STEP).ceil().max(1.0) as u32;
    let mut hi = (font_size / SIZE_STEP).floor() as u32;
    if hi as f32 * SIZE_STEP >= font_size {
        hi = hi.saturating_sub(1);
    }
    if hi < lo {
        return at(lo as f32 * SIZE_STEP);
    }

    let (mut lo_k, mut hi_k) = (lo, hi);
    let mut best: Option<TextLayout> = None;
    while lo_k <= hi_k {
        let mid = lo_k + (hi_k - lo_k) / 2;
        let candidate = at(mid as f32 * SIZE_STEP);
        if candidate.overflows {
            hi_k = mid - 1;
        } else {
            lo_k = mid + 1;
            best = Some(candidate);
        }
    }

    best.unwrap_or_else(|| at(lo as f32 * SIZE_STEP))
}
