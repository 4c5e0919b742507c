#![no_main]

use commit_history::ChangeType;
use commit_history::parsers::{DiffParser, NodeDiffParser};
use libfuzzer_sys::fuzz_target;
use std::panic::AssertUnwindSafe;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let parser = NodeDiffParser::new();

        for filename in ["package.json", "package-lock.json"] {
            let result =
                std::panic::catch_unwind(AssertUnwindSafe(|| parser.parse(content, filename)));

            if let Ok(changes) = result {
                for change in &changes {
                    assert!(!change.name().is_empty(), "name must not be empty");
                    assert_eq!(change.source_file(), filename, "source file must be echoed");

                    match change.change_type() {
                        ChangeType::Added => assert!(
                            change.old_version().is_none() && change.new_version().is_some(),
                            "added change must only carry a new version"
                        ),
                        ChangeType::Removed => assert!(
                            change.old_version().is_some() && change.new_version().is_none(),
                            "removed change must only carry an old version"
                        ),
                        ChangeType::Updated => assert!(
                            change.old_version().is_some()
                                && change.new_version().is_some()
                                && change.old_version() != change.new_version(),
                            "update must carry two different versions"
                        ),
                    }
                }

                assert!(
                    changes.windows(2).all(|w| w[0].name() < w[1].name()),
                    "changes must be sorted by name"
                );
            }
        }
    }
});
