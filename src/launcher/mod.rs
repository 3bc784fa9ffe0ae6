pub mod section;
pub mod usage;

use serde::Deserialize;

use self::section::{ClickAction, ShortcutItem, ShortcutSection, ShortcutUsage, Tile};
use self::usage::UsageRecorder;
use crate::layout::{compute_layout, LayoutConfig, Result, TreeMap, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Treemap,
    List,
}

#[derive(Deserialize)]
struct SectionList {
    sections: Vec<ShortcutSection>,
}

/// Parse the dashboard's section list (`{"sections": [...]}`).
pub fn parse_sections(json: &str) -> serde_json::Result<Vec<ShortcutSection>> {
    serde_json::from_str::<SectionList>(json).map(|list| list.sections)
}

/// Launcher state: which section is shown, how, and the clicks not yet reported.
pub struct Launcher {
    sections: Vec<ShortcutSection>,
    current: usize,
    pub view: ViewMode,
    usage: UsageRecorder,
}

impl Launcher {
    /// Start on the first section.
    pub fn new(sections: Vec<ShortcutSection>) -> Self {
        Self {
            sections,
            current: 0,
            view: ViewMode::default(),
            usage: UsageRecorder::new(),
        }
    }

    pub fn sections(&self) -> &[ShortcutSection] {
        &self.sections
    }

    pub fn current_section(&self) -> Option<&ShortcutSection> {
        self.sections.get(self.current)
    }

    /// Switch to the section with the given id.
    /// Returns true if the shown section changed.
    pub fn select_section(&mut self, id: u64) -> bool {
        match self.sections.iter().position(|s| s.id == id) {
            Some(index) if index != self.current => {
                self.current = index;
                true
            }
            _ => false,
        }
    }

    /// Back from the list view. Returns true if the view changed.
    pub fn show_treemap(&mut self) -> bool {
        let changed = self.view != ViewMode::Treemap;
        self.view = ViewMode::Treemap;
        changed
    }

    /// Items of the current section for the list view, filtered by a
    /// case-insensitive match on the title. An empty query keeps everything.
    pub fn list_items<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a ShortcutItem> + 'a {
        let query = query.to_lowercase();
        self.current_section()
            .into_iter()
            .flat_map(|section| section.items.iter())
            .filter(move |item| item.title.to_lowercase().contains(&query))
    }

    /// Treemap of the current section. Empty when there are no sections.
    pub fn layout(&self, viewport: Viewport, config: &LayoutConfig) -> Result<TreeMap<Tile>> {
        match self.current_section() {
            Some(section) => section.layout(viewport, config),
            None => compute_layout(Vec::new(), Tile::weight, Tile::overflow, viewport, config),
        }
    }

    /// Handle a click on a tile of the current layout.
    pub fn click<'a>(&mut self, tile: &'a Tile) -> ClickAction<'a> {
        match tile {
            Tile::Shortcut(item) => {
                if let Some(section) = self.sections.get_mut(self.current) {
                    self.usage.record(section.id, item.id);
                    section.record_click(item.id);
                }
            }
            Tile::Overflow { .. } => self.view = ViewMode::List,
        }
        tile.on_click()
    }

    /// Page visibility changed. Once hidden, hands back the pending click
    /// batch for reporting.
    pub fn visibility_changed(&mut self, visible: bool) -> Option<Vec<ShortcutUsage>> {
        if visible || self.usage.is_empty() {
            return None;
        }
        let batch = self.usage.drain();
        tracing::debug!("Flushing {} shortcut usage records", batch.len());
        Some(batch)
    }
}
