use std::collections::HashMap;

use super::section::ShortcutUsage;

/// Clicks collected since the last flush, keyed by (section, item).
#[derive(Debug, Default)]
pub struct UsageRecorder {
    pending: HashMap<(u64, u64), u32>,
}

impl UsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, section_id: u64, item_id: u64) {
        *self.pending.entry((section_id, item_id)).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Take the pending batch, ordered by section then item.
    pub fn drain(&mut self) -> Vec<ShortcutUsage> {
        let mut usages: Vec<ShortcutUsage> = self
            .pending
            .drain()
            .map(|((section_id, item_id), click_count)| ShortcutUsage {
                section_id,
                item_id,
                click_count,
            })
            .collect();
        usages.sort_by_key(|u| (u.section_id, u.item_id));
        usages
    }
}
