// Presentation adapter: column selection, row ordering and the colour scale
// for percentile cells.

use std::cmp::Ordering;

use crate::dataset::{Dataset, IdentityField, PlayerSeason};
use crate::filter::View;

/// Percentile fields preferred as sort keys, in priority order.
pub const DEFAULT_SORT_PREFERENCE: [&str; 2] =
    ["defensive_impact_iso_pct", "defensive_impact_pick_pct"];

/// Numeric range of every percentile field, for scale mapping.
pub const PCT_RANGE: (f64, f64) = (0.0, 100.0);

/// Displayed when a percentile is missing.
pub const MISSING_PCT: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Percentile { field: String, index: usize },
    Player,
}

impl SortKey {
    pub fn label(&self) -> &str {
        match self {
            SortKey::Percentile { field, .. } => field.as_str(),
            SortKey::Player => IdentityField::Player.column(),
        }
    }
}

/// Sort keys for a dataset: the preferred percentile fields that exist, or
/// the display name when none do.
pub fn sort_keys(dataset: &Dataset, preference: &[String]) -> Vec<SortKey> {
    let keys: Vec<SortKey> = preference
        .iter()
        .filter_map(|field| {
            dataset.pct_index(field).map(|index| SortKey::Percentile {
                field: field.clone(),
                index,
            })
        })
        .collect();
    if keys.is_empty() {
        vec![SortKey::Player]
    } else {
        keys
    }
}

/// Descending with missing values last.
fn cmp_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_records(keys: &[SortKey], a: &PlayerSeason, b: &PlayerSeason) -> Ordering {
    for key in keys {
        let ord = match key {
            SortKey::Percentile { index, .. } => {
                cmp_desc_missing_last(a.percentiles[*index], b.percentiles[*index])
            }
            SortKey::Player => b.player.cmp(&a.player),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// The table handed to a renderer: which columns, which rows, in what order.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub identity_columns: Vec<IdentityField>,
    pub pct_fields: Vec<String>,
    pub sort_keys: Vec<SortKey>,
    rows: Vec<usize>,
}

impl Presentation {
    /// Order a filtered view for display. Stable, so rows that tie on every
    /// key keep their source order.
    pub fn build(view: &View<'_>, sort_preference: &[String]) -> Self {
        let dataset = view.dataset();
        let records = dataset.records();
        let keys = sort_keys(dataset, sort_preference);
        let mut rows = view.indices().to_vec();
        rows.sort_by(|&a, &b| compare_records(&keys, &records[a], &records[b]));
        Presentation {
            identity_columns: IdentityField::ALL.to_vec(),
            pct_fields: dataset.pct_fields().to_vec(),
            sort_keys: keys,
            rows,
        }
    }

    /// Indices into `Dataset::records`, in display order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a PlayerSeason> + 'a {
        let records = dataset.records();
        self.rows.iter().map(move |&i| &records[i])
    }

    /// Header names: identity columns followed by percentile fields.
    pub fn column_names(&self) -> Vec<String> {
        self.identity_columns
            .iter()
            .map(|f| f.column().to_string())
            .chain(self.pct_fields.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One decimal place, or `MISSING_PCT`.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => MISSING_PCT.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Colour scale
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
}

/// ColorBrewer RdBu, 11 stops: low is red, high is blue.
const RDBU: [Rgb; 11] = [
    Rgb::new(103, 0, 31),
    Rgb::new(178, 24, 43),
    Rgb::new(214, 96, 77),
    Rgb::new(244, 165, 130),
    Rgb::new(253, 219, 199),
    Rgb::new(247, 247, 247),
    Rgb::new(209, 229, 240),
    Rgb::new(146, 197, 222),
    Rgb::new(67, 147, 195),
    Rgb::new(33, 102, 172),
    Rgb::new(5, 48, 97),
];

/// Relative luminance below which cell text switches to white.
const TEXT_LUMINANCE_THRESHOLD: f64 = 0.408;

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}

/// Map a percentile linearly onto the diverging scale, 0 at one end and 100
/// at the other. Out-of-range values clamp.
pub fn pct_color(value: f64) -> Rgb {
    let (lo, hi) = PCT_RANGE;
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    let scaled = t * (RDBU.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(RDBU.len() - 2);
    let frac = scaled - i as f64;
    let (a, b) = (RDBU[i], RDBU[i + 1]);
    Rgb::new(lerp(a.r, b.r, frac), lerp(a.g, b.g, frac), lerp(a.b, b.b, frac))
}

fn relative_luminance(c: Rgb) -> f64 {
    let channel = |v: u8| {
        let x = f64::from(v) / 255.0;
        if x <= 0.04045 {
            x / 12.92
        } else {
            ((x + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * channel(c.r) + 0.7152 * channel(c.g) + 0.0722 * channel(c.b)
}

/// Legible text colour on the given background.
pub fn text_color(background: Rgb) -> Rgb {
    if relative_luminance(background) < TEXT_LUMINANCE_THRESHOLD {
        Rgb::WHITE
    } else {
        Rgb::BLACK
    }
}

/// (background, foreground) for a percentile cell; `None` leaves a missing
/// cell unstyled.
pub fn cell_colors(value: Option<f64>) -> Option<(Rgb, Rgb)> {
    value.map(|v| {
        let bg = pct_color(v);
        (bg, text_color(bg))
    })
}
