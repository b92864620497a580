use crate::{HarvestItem, ManifestEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the paginated query and answer with `HarvestCompleted` or `HarvestFailed`.
    Harvest,
    /// Answer with `FallbackLoaded`.
    LoadFallback,
    /// Skip or download one item and answer with `ItemMirrored`.
    MirrorItem { index: usize, item: HarvestItem },
    WriteManifest { entries: Vec<ManifestEntry> },
}
