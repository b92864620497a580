use crate::{
    extract_items, normalize_fallback, Effect, HarvestItem, HarvestSource, Msg, Phase, RunState,
};

const DEADLINE_REASON: &str = "deadline exceeded";

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not fit the current phase are ignored.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match (state.phase(), msg) {
        (Phase::Idle, Msg::Start) => {
            state.set_phase(Phase::Harvesting);
            vec![Effect::Harvest]
        }
        (Phase::Harvesting, Msg::HarvestCompleted(pages)) => {
            let items = extract_items(&pages, state.rules());
            start_mirroring(&mut state, items, HarvestSource::Remote)
        }
        (Phase::Harvesting, Msg::HarvestFailed(error)) => {
            state.set_harvest_error(error);
            state.set_phase(Phase::FallbackHarvesting);
            vec![Effect::LoadFallback]
        }
        (Phase::FallbackHarvesting, Msg::FallbackLoaded(items)) => {
            let items = normalize_fallback(items, state.rules());
            if items.is_empty() {
                state.set_phase(Phase::Aborted);
                Vec::new()
            } else {
                start_mirroring(&mut state, items, HarvestSource::Fallback)
            }
        }
        (Phase::Mirroring, Msg::ItemMirrored { index, outcome }) => {
            if index != state.next_index() {
                return (state, Vec::new());
            }
            state.record_outcome(outcome);
            next_or_finalize(&mut state)
        }
        (Phase::Mirroring, Msg::DeadlineExpired) => {
            state.fail_remaining(DEADLINE_REASON);
            finalize(&mut state)
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn start_mirroring(
    state: &mut RunState,
    items: Vec<HarvestItem>,
    source: HarvestSource,
) -> Vec<Effect> {
    state.set_items(items, source);
    state.set_phase(Phase::Mirroring);
    next_or_finalize(state)
}

fn next_or_finalize(state: &mut RunState) -> Vec<Effect> {
    match state.next_item() {
        Some((index, item)) => vec![Effect::MirrorItem { index, item }],
        None => finalize(state),
    }
}

fn finalize(state: &mut RunState) -> Vec<Effect> {
    state.set_phase(Phase::Finalized);
    vec![Effect::WriteManifest {
        entries: state.manifest_entries(),
    }]
}
