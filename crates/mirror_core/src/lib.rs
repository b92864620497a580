//! Mirror core: item extraction rules and the pure run state machine.
mod effect;
mod extract;
mod filename;
mod item;
mod msg;
mod rules;
mod state;
mod update;

pub use effect::Effect;
pub use extract::{extract_items, normalize_fallback};
pub use filename::{sanitize_filename, sanitize_stem};
pub use item::{HarvestItem, ItemOutcome, ManifestEntry, RawPage};
pub use msg::Msg;
pub use rules::{ExtractRules, ItemOrder};
pub use state::{HarvestSource, Phase, RunState, RunStats};
pub use update::update;
