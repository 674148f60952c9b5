//! Printer discovery from entity naming conventions.
//!
//! Printers are never announced by the host; they are inferred from sensor
//! identifiers of the form `sensor.<key>_<field>` where `<field>` is one of a
//! fixed set of status suffixes.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::state::StateSnapshot;

/// Status suffixes that mark a sensor as belonging to a printer.
pub const FIELD_SUFFIXES: &[&str] = &[
    "progress",
    "state_text",
    "nozzle_temp",
    "bed_temp",
    "chamber_temp",
    "file",
    "job_time",
    "time_left",
    "layer",
    "total_layers",
    "state_code",
];

/// Trailing words stripped from a captured key (`k1_max_print` -> `k1_max`).
const NOISE_SUFFIXES: &[&str] = &[
    "print", "current", "status", "job", "file", "progress", "state", "temp", "chamber", "bed",
    "nozzle",
];

/// A discovered printer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PrinterDescriptor {
    pub key: String,
    pub label: String,
}

impl PrinterDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let label = pretty_key(&key);
        Self { key, label }
    }
}

/// Discover the distinct printers visible in `snapshot`, sorted by label.
///
/// A non-empty `filter` keeps only identifiers containing it.
pub fn discover(snapshot: &StateSnapshot, filter: Option<&str>) -> Vec<PrinterDescriptor> {
    let filter = filter.filter(|f| !f.is_empty());

    let mut keys = HashSet::new();
    for entity in snapshot.sensors() {
        let id = entity.entity_id.as_str();
        if let Some(filter) = filter {
            if !id.contains(filter) {
                continue;
            }
        }

        let Some(captured) = match_status_sensor(id) else {
            continue;
        };
        let key = strip_noise(captured);
        if !key.is_empty() {
            keys.insert(key.to_string());
        }
    }

    let mut printers: Vec<_> = keys.into_iter().map(PrinterDescriptor::new).collect();
    printers.sort_by(|a, b| natural_cmp(&a.label, &b.label).then_with(|| a.key.cmp(&b.key)));
    printers
}

/// Match `sensor.<key>_<suffix>` against the whole identifier and return the
/// shortest non-empty key for which the remainder is exactly one suffix.
fn match_status_sensor(entity_id: &str) -> Option<&str> {
    let rest = entity_id.strip_prefix("sensor.")?;
    rest.char_indices()
        .filter(|&(i, c)| c == '_' && i > 0)
        .find(|&(i, _)| FIELD_SUFFIXES.contains(&&rest[i + 1..]))
        .map(|(i, _)| &rest[..i])
}

/// Repeatedly drop `_<noise>` words from the end, then trailing underscores.
fn strip_noise(key: &str) -> &str {
    let mut key = key;
    'strip: loop {
        for noise in NOISE_SUFFIXES {
            // `_` plus the word, compared without regard to case.
            let len = noise.len() + 1;
            if key.len() < len || !key.is_char_boundary(key.len() - len) {
                continue;
            }
            let (head, tail) = key.split_at(key.len() - len);
            if tail.starts_with('_') && tail[1..].eq_ignore_ascii_case(noise) {
                key = head;
                continue 'strip;
            }
        }
        break;
    }
    key.trim_end_matches('_')
}

/// Human label for a key: separators become spaces and each word is
/// capitalised (`k1_max` -> `K1 Max`).
pub fn pretty_key(key: &str) -> String {
    let spaced = key.replace(['_', '.', '\\'], " ");

    let mut label = String::with_capacity(spaced.len());
    let mut prev_word = false;
    for c in spaced.chars() {
        let word = c.is_ascii_alphanumeric() || c == '_';
        if word && !prev_word {
            label.push(c.to_ascii_uppercase());
        } else {
            label.push(c);
        }
        prev_word = word;
    }
    label
}

/// Compare labels the way a person would: digit runs by value, everything
/// else without regard to case. Labels equal apart from case put lower case
/// first, so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = a.chars().peekable();
    let mut ys = b.chars().peekable();

    loop {
        match (xs.peek().copied(), ys.peek().copied()) {
            (None, None) => return case_tie_break(a, b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let mut dx = String::new();
                while let Some(c) = xs.next_if(|c| c.is_ascii_digit()) {
                    dx.push(c);
                }
                let mut dy = String::new();
                while let Some(c) = ys.next_if(|c| c.is_ascii_digit()) {
                    dy.push(c);
                }
                let nx = dx.trim_start_matches('0');
                let ny = dy.trim_start_matches('0');
                let ord = nx.len().cmp(&ny.len()).then_with(|| nx.cmp(ny));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                xs.next();
                ys.next();
            }
        }
    }
}

/// Order for labels that only differ by case: lower case first.
fn case_tie_break(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x == y {
            continue;
        }
        if x.to_lowercase().eq(y.to_lowercase()) {
            return y.is_lowercase().cmp(&x.is_lowercase());
        }
        return x.cmp(&y);
    }
    a.len().cmp(&b.len())
}
