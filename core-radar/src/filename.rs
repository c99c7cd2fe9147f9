//! # Filename Model
//!
//! Classifies cache and remote entries purely from the `IDR<id>.<...>.png`
//! naming convention used by the radar mirror.
//!
//! - Backgrounds: `IDR032.background.png`, `IDR032.topography.png`, ...
//! - Frames: `IDR032.T.201803210500.png` (the last segment is a local
//!   `YYYYMMDDHHmm` wall-clock timestamp)
//! - Composite artifacts: `IDR032.composite.gif`
//!
//! Everything here is pure: no I/O, and malformed names classify as
//! [`Role::Unclassified`] instead of failing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const NAME_PREFIX: &str = "IDR";
const IMAGE_SUFFIX: &str = ".png";
const TIMESTAMP_DIGITS: usize = 12;

/// Static overlay layers published alongside the radar frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundKind {
    /// Opaque base map, always drawn first
    Background,
    Catchments,
    Locations,
    Rail,
    Range,
    RiverBasins,
    Roads,
    Topography,
    WaterWays,
    WthrDistricts,
}

impl BackgroundKind {
    pub const ALL: [BackgroundKind; 10] = [
        BackgroundKind::Background,
        BackgroundKind::Catchments,
        BackgroundKind::Locations,
        BackgroundKind::Rail,
        BackgroundKind::Range,
        BackgroundKind::RiverBasins,
        BackgroundKind::Roads,
        BackgroundKind::Topography,
        BackgroundKind::WaterWays,
        BackgroundKind::WthrDistricts,
    ];

    /// Token as it appears in filenames and settings keys
    pub fn token(self) -> &'static str {
        match self {
            BackgroundKind::Background => "background",
            BackgroundKind::Catchments => "catchments",
            BackgroundKind::Locations => "locations",
            BackgroundKind::Rail => "rail",
            BackgroundKind::Range => "range",
            BackgroundKind::RiverBasins => "riverBasins",
            BackgroundKind::Roads => "roads",
            BackgroundKind::Topography => "topography",
            BackgroundKind::WaterWays => "waterWays",
            BackgroundKind::WthrDistricts => "wthrDistricts",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }

    pub fn is_base(self) -> bool {
        self == BackgroundKind::Background
    }
}

impl fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Semantic role of a file, derived from its name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Animation frame; `timestamp` is absent when the 12 digits are not a
    /// real calendar date
    Frame { timestamp: Option<NaiveDateTime> },
    Background(BackgroundKind),
    Unclassified,
}

/// Last path component, so both bare names and full paths are accepted
fn base_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

/// `IDR<id>.` prefix every file of one site shares
pub fn site_prefix(site_id: &str) -> String {
    format!("{}{}.", NAME_PREFIX, site_id)
}

/// Segments between the `IDR<id>.` prefix and the `.png` suffix
fn inner_segments<'a>(name: &'a str, site_id: &str) -> Option<Vec<&'a str>> {
    let rest = name.strip_prefix(NAME_PREFIX)?.strip_prefix(site_id)?;
    let inner = rest.strip_prefix('.')?.strip_suffix(IMAGE_SUFFIX)?;
    if inner.is_empty() {
        return None;
    }
    Some(inner.split('.').collect())
}

fn is_timestamp_segment(segment: &str) -> bool {
    segment.len() == TIMESTAMP_DIGITS && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Classify `name` for the radar site `site_id`
///
/// Only the segment right before `.png` decides the role: a background token
/// there makes a background, twelve digits make a frame.
pub fn classify(name: &str, site_id: &str) -> Role {
    let name = base_name(name);
    let Some(last) = inner_segments(name, site_id).and_then(|segments| segments.last().copied())
    else {
        return Role::Unclassified;
    };

    match BackgroundKind::from_token(last) {
        Some(kind) => Role::Background(kind),
        None if is_timestamp_segment(last) => Role::Frame {
            timestamp: parse_timestamp(name),
        },
        None => Role::Unclassified,
    }
}

/// Decode the `YYYYMMDDHHmm` segment of a frame name
///
/// The value is local wall-clock time at minute resolution. Returns `None`
/// when the name does not end in `.<12 digits>.png` or the digits do not
/// form a valid date and time.
pub fn parse_timestamp(name: &str) -> Option<NaiveDateTime> {
    let name = base_name(name);
    if !name.starts_with(NAME_PREFIX) {
        return None;
    }
    let stem = name.strip_suffix(IMAGE_SUFFIX)?;
    let (_, digits) = stem.rsplit_once('.')?;
    if !is_timestamp_segment(digits) {
        return None;
    }

    let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();
    let year = digits[0..4].parse::<i32>().ok()?;
    let month = field(4..6)?;
    let day = field(6..8)?;
    let hour = field(8..10)?;
    let minute = field(10..12)?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

/// Deterministic name of the rendered animation
pub fn composite_file_name(site_id: &str, format: &str) -> String {
    format!("{}{}.composite.{}", NAME_PREFIX, site_id, format)
}
