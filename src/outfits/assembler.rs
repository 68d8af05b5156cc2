use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::{items::repo_types::Item, tagging::TagRecord};

/// Slots filled first, in this order. Any other slot follows alphabetically.
pub const SLOT_PRIORITY: [&str; 6] = ["top", "bottom", "shoes", "outerwear", "accessory", "dress"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutfitFilters {
    pub formality: Option<String>,
    pub color: Option<String>,
    pub season: Option<String>,
}

fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl OutfitFilters {
    /// Builds filters from raw query values; blank values count as absent.
    pub fn new(formality: Option<String>, color: Option<String>, season: Option<String>) -> Self {
        Self {
            formality: present(formality),
            color: present(color),
            season: present(season),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.formality.is_none() && self.color.is_none() && self.season.is_none()
    }

    pub fn matches(&self, tags: &TagRecord) -> bool {
        if let Some(f) = &self.formality {
            if !tags.formality.eq_ignore_ascii_case(f) {
                return false;
            }
        }
        if let Some(c) = &self.color {
            if !tags.color_primary.eq_ignore_ascii_case(c) {
                return false;
            }
        }
        if let Some(s) = &self.season {
            if !tags.season.iter().any(|v| v.eq_ignore_ascii_case(s)) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("no items match the requested filters ({total_items_available} items in closet)")]
    NoMatchingItems { total_items_available: usize },
}

/// One randomly assembled outfit. Never persisted.
#[derive(Debug, Clone)]
pub struct GeneratedOutfit {
    pub outfit: BTreeMap<String, Item>,
    pub slots_used: Vec<String>,
    /// Number of items that passed the filters.
    pub total_items: usize,
    pub items_by_slot: BTreeMap<String, usize>,
}

/// Picks at most one item per slot from the items matching `filters`.
pub fn generate<R: Rng + ?Sized>(
    items: &[Item],
    filters: &OutfitFilters,
    rng: &mut R,
) -> Result<GeneratedOutfit, AssemblyError> {
    let not_found = AssemblyError::NoMatchingItems {
        total_items_available: items.len(),
    };

    let mut by_slot: BTreeMap<&str, Vec<&Item>> = BTreeMap::new();
    let mut total_items = 0;
    for item in items.iter().filter(|i| filters.matches(&i.tags)) {
        by_slot.entry(item.tags.slot.as_str()).or_default().push(item);
        total_items += 1;
    }
    if total_items == 0 {
        return Err(not_found);
    }

    let order = SLOT_PRIORITY.iter().copied().chain(
        by_slot
            .keys()
            .copied()
            .filter(|s| !SLOT_PRIORITY.contains(s)),
    );

    let mut outfit = BTreeMap::new();
    let mut slots_used = Vec::new();
    for slot in order {
        let Some(pick) = by_slot.get(slot).and_then(|c| c.choose(&mut *rng)) else {
            continue;
        };
        outfit.insert(slot.to_string(), (*pick).clone());
        slots_used.push(slot.to_string());
    }
    if outfit.is_empty() {
        return Err(not_found);
    }

    let items_by_slot = by_slot
        .iter()
        .map(|(slot, c)| (slot.to_string(), c.len()))
        .collect();

    Ok(GeneratedOutfit {
        outfit,
        slots_used,
        total_items,
        items_by_slot,
    })
}
