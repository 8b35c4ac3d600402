#![no_main]

use circlerank_core::{ScoreDocument, ScoringConfig, score_json};
use libfuzzer_sys::fuzz_target;

// Any document that parses must score to finite, serializable output.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(report) = score_json(text, None, &ScoringConfig::default()) else {
        return;
    };
    for record in &report.scores {
        assert!(record.influence_score.is_finite());
        assert!(record.influence_score >= 0.0);
    }
    let document = ScoreDocument::from_report(&report);
    let json = document.to_json_pretty().expect("finite scores serialize");
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
});
