#![no_main]

use libfuzzer_sys::fuzz_target;
use serialist_core::pack::{ChapterOutput, parse_pack_str, word_count};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = word_count(text);
    if let Ok(output) = ChapterOutput::split(text) {
        ChapterOutput::split(&output.render()).expect("rendered output carries both markers");
        let _ = parse_pack_str(&output.pack_raw);
    }
});
