use crate::{ExtractRules, HarvestItem, ItemOutcome, ManifestEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Harvesting,
    /// The remote harvest failed; waiting for the static item list.
    FallbackHarvesting,
    Mirroring,
    /// Manifest write requested; nothing left to do.
    Finalized,
    /// Harvest failed and the fallback list was empty.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }

    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Downloaded => self.downloaded += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// State of a single run. Owned by whoever drives [`crate::update`]; nothing
/// outlives the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    phase: Phase,
    rules: ExtractRules,
    source: Option<HarvestSource>,
    harvest_error: Option<String>,
    items: Vec<HarvestItem>,
    /// One entry per finished item, in item order.
    outcomes: Vec<ItemOutcome>,
    stats: RunStats,
}

impl RunState {
    pub fn new(rules: ExtractRules) -> Self {
        Self {
            phase: Phase::Idle,
            rules,
            source: None,
            harvest_error: None,
            items: Vec::new(),
            outcomes: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &ExtractRules {
        &self.rules
    }

    pub fn source(&self) -> Option<HarvestSource> {
        self.source
    }

    pub fn harvest_error(&self) -> Option<&str> {
        self.harvest_error.as_deref()
    }

    pub fn items(&self) -> &[HarvestItem] {
        &self.items
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finalized | Phase::Aborted)
    }

    /// Every item in run order, whatever its outcome.
    pub fn manifest_entries(&self) -> Vec<ManifestEntry> {
        self.items.iter().map(HarvestItem::manifest_entry).collect()
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn set_harvest_error(&mut self, error: String) {
        self.harvest_error = Some(error);
    }

    pub(crate) fn set_items(&mut self, items: Vec<HarvestItem>, source: HarvestSource) {
        self.items = items;
        self.source = Some(source);
        self.outcomes.clear();
        self.stats = RunStats::default();
    }

    pub(crate) fn next_index(&self) -> usize {
        self.outcomes.len()
    }

    pub(crate) fn next_item(&self) -> Option<(usize, HarvestItem)> {
        let index = self.next_index();
        self.items.get(index).cloned().map(|item| (index, item))
    }

    pub(crate) fn record_outcome(&mut self, outcome: ItemOutcome) {
        self.stats.record(&outcome);
        self.outcomes.push(outcome);
    }

    pub(crate) fn fail_remaining(&mut self, reason: &str) {
        while self.next_index() < self.items.len() {
            self.record_outcome(ItemOutcome::Failed(reason.to_string()));
        }
    }
}
