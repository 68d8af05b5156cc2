//! Synthetic tags for running without a vision model.

use rand::{seq::SliceRandom, Rng};

use super::{record::TagRecord, ItemHint};

pub const MOCK_NOTES: &str =
    "[MOCK MODE] Demo data only. Configure OPENAI_API_KEY for real image analysis.";

pub const SEASONS: [&str; 4] = ["spring", "summer", "fall", "winter"];
const COLORS: [&str; 10] = [
    "black", "white", "blue", "red", "green", "yellow", "pink", "brown", "gray", "navy",
];
const PATTERNS: [&str; 6] = ["solid", "striped", "plaid", "polka dot", "floral", "geometric"];
const MATERIALS: [&str; 6] = ["cotton", "denim", "leather", "polyester", "wool", "silk"];
const FITS: [&str; 5] = ["slim", "regular", "loose", "oversized", "fitted"];
const FORMALITIES: [&str; 4] = ["casual", "business casual", "formal", "sporty"];
const FEATURES: [&str; 5] = ["long sleeve", "short sleeve", "pockets", "hood", "zipper"];
const FALLBACK_SLOTS: [&str; 3] = ["top", "bottom", "shoes"];

// first match wins
const SLOT_HINTS: &[(&str, &[&str])] = &[
    ("top", &["shirt", "top", "blouse", "sweater"]),
    ("bottom", &["pant", "jean", "short", "skirt"]),
    ("shoes", &["shoe", "boot", "sandal", "sneaker"]),
    ("outerwear", &["jacket", "coat"]),
    ("accessory", &["sunglass", "hat", "bag"]),
    ("dress", &["dress"]),
];

fn types_for(slot: &str) -> &'static [&'static str] {
    match slot {
        "top" => &["t-shirt", "shirt", "blouse", "sweater", "hoodie"],
        "bottom" => &["jeans", "pants", "shorts", "skirt"],
        "shoes" => &["sneakers", "boots", "sandals", "heels"],
        "outerwear" => &["jacket", "coat", "blazer"],
        "accessory" => &["sunglasses", "hat", "bag", "watch"],
        "dress" => &["dress", "gown"],
        _ => &[],
    }
}

pub fn guess_slot(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    SLOT_HINTS
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| text.contains(n)))
        .map(|(slot, _)| *slot)
}

pub fn mock_tags<R: Rng + ?Sized>(
    file_name: &str,
    hint: Option<&ItemHint>,
    rng: &mut R,
) -> TagRecord {
    let slot = hint
        .and_then(|h| guess_slot(&h.item_type))
        .or_else(|| guess_slot(file_name))
        .or_else(|| FALLBACK_SLOTS.choose(rng).copied())
        .unwrap_or("top");

    let item_type = types_for(slot)
        .choose(rng)
        .map(|t| t.to_string())
        .or_else(|| hint.map(|h| h.item_type.clone()))
        .unwrap_or_else(|| "clothing".into());

    TagRecord {
        slot: slot.into(),
        item_type,
        color_primary: pick(&COLORS, rng),
        colors_secondary: maybe_subset(&COLORS, rng),
        pattern: pick(&PATTERNS, rng),
        material: pick(&MATERIALS, rng),
        fit: pick(&FITS, rng),
        formality: pick(&FORMALITIES, rng),
        season: subset(&SEASONS, rng.gen_range(1..=3), rng),
        features: maybe_subset(&FEATURES, rng),
        brand_or_logo_visible: rng.gen_bool(0.3),
        notes: MOCK_NOTES.into(),
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> String {
    pool.choose(rng).copied().unwrap_or("unknown").to_string()
}

fn subset<R: Rng + ?Sized>(pool: &[&str], n: usize, rng: &mut R) -> Vec<String> {
    pool.choose_multiple(rng, n).map(|s| s.to_string()).collect()
}

/// Empty half the time, otherwise up to two distinct entries.
fn maybe_subset<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> Vec<String> {
    if rng.gen_bool(0.5) {
        Vec::new()
    } else {
        let n = rng.gen_range(0..=2);
        subset(pool, n, rng)
    }
}
