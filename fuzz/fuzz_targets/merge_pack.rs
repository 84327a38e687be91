#![no_main]

use libfuzzer_sys::fuzz_target;
use serialist_core::minify::minify_continuity;
use serialist_core::model::{ChapterPack, ContinuityState};

fuzz_target!(|data: &[u8]| {
    let Ok(pack) = serde_json::from_slice::<ChapterPack>(data) else {
        return;
    };
    let mut state = ContinuityState::default();
    state.apply_pack(&pack);
    state.apply_pack(&pack);

    let ids: Vec<&str> = state.open_loops.iter().map(|t| t.id.as_str()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "open loops sorted and unique");
    for id in &pack.resolved_loops {
        assert!(!ids.contains(&id.as_str()));
    }
    let _ = minify_continuity(&state);
});
