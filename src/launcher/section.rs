use compact_str::{format_compact, CompactString};
use serde::{Deserialize, Serialize};

use crate::layout::{compute_layout, LayoutConfig, Result, TreeMap, Viewport};

/// Where a shortcut opens. Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TargetType {
    #[default]
    SelfTab,
    NewTab,
    Embed,
}

impl TryFrom<u8> for TargetType {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(TargetType::SelfTab),
            1 => Ok(TargetType::NewTab),
            2 => Ok(TargetType::Embed),
            other => Err(format!("unknown shortcut target type {}", other)),
        }
    }
}

impl From<TargetType> for u8 {
    fn from(target: TargetType) -> u8 {
        match target {
            TargetType::SelfTab => 0,
            TargetType::NewTab => 1,
            TargetType::Embed => 2,
        }
    }
}

/// Click count of one item within one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutUsage {
    #[serde(default)]
    pub section_id: u64,
    #[serde(default)]
    pub item_id: u64,
    pub click_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutItem {
    pub id: u64,
    pub title: CompactString,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub target: TargetType,
    #[serde(default)]
    pub usages: Vec<ShortcutUsage>,
}

impl ShortcutItem {
    /// Clicks recorded for this item across its usage records. Items never
    /// clicked count as 1 so they still get a tile.
    pub fn click_count(&self) -> u32 {
        if self.usages.is_empty() {
            return 1;
        }
        self.usages
            .iter()
            .fold(0u32, |total, u| total.saturating_add(u.click_count))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutSection {
    pub id: u64,
    pub name: CompactString,
    #[serde(default)]
    pub items: Vec<ShortcutItem>,
}

impl ShortcutSection {
    /// Lay out this section's shortcuts, weighted by click count.
    pub fn layout(&self, viewport: Viewport, config: &LayoutConfig) -> Result<TreeMap<Tile>> {
        compute_layout(
            self.items.iter().cloned().map(Tile::Shortcut),
            Tile::weight,
            Tile::overflow,
            viewport,
            config,
        )
    }

    /// Count a click locally so the next layout reflects it.
    /// Returns false if the section has no such item.
    pub fn record_click(&mut self, item_id: u64) -> bool {
        let section_id = self.id;
        let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) else {
            return false;
        };
        if item.usages.is_empty() {
            item.usages.push(ShortcutUsage {
                section_id,
                item_id,
                click_count: 1,
            });
        }
        item.usages[0].click_count += 1;
        true
    }
}

/// What a click on a tile should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction<'a> {
    Open { url: &'a str, target: TargetType },
    /// Embedded shortcuts are handled in place
    Embed,
    /// Overflow tile: switch to the full list
    ShowAll,
}

/// Treemap payload: a real shortcut, or the overflow tile holding whatever
/// did not fit.
#[derive(Debug, Clone, PartialEq)]
pub enum Tile {
    Shortcut(ShortcutItem),
    Overflow { weight: f64, hidden: Vec<ShortcutItem> },
}

impl Tile {
    pub fn weight(&self) -> f64 {
        match self {
            Tile::Shortcut(item) => f64::from(item.click_count()),
            Tile::Overflow { weight, .. } => *weight,
        }
    }

    /// Rest factory for the layout engine.
    pub fn overflow(weight: f64, tiles: Vec<Tile>) -> Tile {
        let mut hidden = Vec::with_capacity(tiles.len());
        for tile in tiles {
            match tile {
                Tile::Shortcut(item) => hidden.push(item),
                Tile::Overflow { hidden: nested, .. } => hidden.extend(nested),
            }
        }
        Tile::Overflow { weight, hidden }
    }

    pub fn label(&self) -> CompactString {
        match self {
            Tile::Shortcut(item) => item.title.clone(),
            Tile::Overflow { hidden, .. } => format_compact!("{}", hidden.len()),
        }
    }

    pub fn on_click(&self) -> ClickAction<'_> {
        match self {
            Tile::Shortcut(item) => match item.target {
                TargetType::Embed => ClickAction::Embed,
                target => ClickAction::Open {
                    url: &item.url,
                    target,
                },
            },
            Tile::Overflow { .. } => ClickAction::ShowAll,
        }
    }
}
