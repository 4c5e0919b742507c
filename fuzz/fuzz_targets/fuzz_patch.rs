#![no_main]

use commit_history::DiffParserRegistry;
use commit_history::patch::split_patch;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(patch) = std::str::from_utf8(data) {
        let files = split_patch(patch);
        let registry = DiffParserRegistry::new();

        for change in registry.parse_all(&files) {
            assert!(
                files.contains_key(change.source_file()),
                "source file must be one of the split paths"
            );
        }
    }
});
