use crate::{HarvestItem, ItemOutcome, RawPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin the run.
    Start,
    /// The paginated query returned every page record.
    HarvestCompleted(Vec<RawPage>),
    /// The paginated query failed; carries the error text for reporting.
    HarvestFailed(String),
    /// Static items substituted for a failed harvest.
    FallbackLoaded(Vec<HarvestItem>),
    /// The item at `index` was mirrored, skipped or failed.
    ItemMirrored { index: usize, outcome: ItemOutcome },
    /// The run deadline passed while an item was in flight.
    DeadlineExpired,
}
