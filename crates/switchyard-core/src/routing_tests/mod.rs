//! Selection and fallback tests over hand-built candidate sets.


use super::catalog::tests::entry;
use super::resolver::FilteredCandidate;
use super::types::CandidateRef;

/// Builds a viable candidate with the given window and rates.
fn candidate(
    provider: &str,
    model: &str,
    priority: u32,
    window: u64,
    input: f64,
    output: f64,
) -> FilteredCandidate {
    FilteredCandidate::from_entry(
        &CandidateRef::new(provider, model, priority),
        &entry(provider, model, window, input, output),
    )
}
