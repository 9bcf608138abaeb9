//! Best-fit aspect-ratio selection.
//!
//! Candidates are compared by relative difference
//! `|image - candidate| / max(image, candidate)`, so a portrait image and its
//! landscape mirror score symmetrically. The scan keeps the first minimum, which
//! makes ties resolve to the earlier entry of the table.

/// One candidate ratio `w:h` and its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ratio {
    pub w: u32,
    pub h: u32,
    pub label: &'static str,
}

impl Ratio {
    pub const fn new(w: u32, h: u32, label: &'static str) -> Self {
        Ratio { w, h, label }
    }

    pub fn value(&self) -> f64 {
        self.w as f64 / self.h as f64
    }
}

pub const DEFAULT_RATIO: &str = "1:1";

/// Ratios offered when inferring an output ratio from a source image.
pub const STANDARD_RATIOS: &[Ratio] = &[
    Ratio::new(1, 1, "1:1"),
    Ratio::new(4, 3, "4:3"),
    Ratio::new(3, 4, "3:4"),
    Ratio::new(16, 9, "16:9"),
    Ratio::new(9, 16, "9:16"),
    Ratio::new(21, 9, "21:9"),
    Ratio::new(9, 21, "9:21"),
];

/// Ratios accepted by the gemini-3 editor.
pub const GEMINI_RATIOS: &[Ratio] = &[
    Ratio::new(1, 1, "1:1"),
    Ratio::new(2, 3, "2:3"),
    Ratio::new(3, 2, "3:2"),
    Ratio::new(3, 4, "3:4"),
    Ratio::new(4, 3, "4:3"),
    Ratio::new(4, 5, "4:5"),
    Ratio::new(5, 4, "5:4"),
    Ratio::new(9, 16, "9:16"),
    Ratio::new(16, 9, "16:9"),
    Ratio::new(21, 9, "21:9"),
];

/// Closest label from [`STANDARD_RATIOS`]. Missing or zero dimensions give `"1:1"`.
pub fn select_closest_ratio(width: Option<u32>, height: Option<u32>) -> &'static str {
    closest_in(STANDARD_RATIOS, width, height)
}

/// Closest label from `table`. Missing or zero dimensions, or an empty table,
/// give `"1:1"`.
pub fn closest_in(table: &[Ratio], width: Option<u32>, height: Option<u32>) -> &'static str {
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return DEFAULT_RATIO,
    };
    let image = w as f64 / h as f64;

    let mut best: Option<(&Ratio, f64)> = None;
    for candidate in table {
        let value = candidate.value();
        let diff = (image - value).abs() / image.max(value);
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((candidate, diff)),
        }
    }
    best.map(|(r, _)| r.label).unwrap_or(DEFAULT_RATIO)
}

/// Whether `label` is one of the entries of `table`.
pub fn is_known(table: &[Ratio], label: &str) -> bool {
    table.iter().any(|r| r.label == label)
}

/// Recommended seedream output size for a ratio label; the longest side is 2048.
/// Unknown labels map to a square.
pub fn ratio_to_resolution(label: &str) -> (u32, u32) {
    match label {
        "4:3" => (2048, 1536),
        "16:9" => (2048, 1152),
        "3:4" => (1536, 2048),
        "9:16" => (1152, 2048),
        "21:9" => (2048, 878),
        "9:21" => (878, 2048),
        _ => (2048, 2048),
    }
}
