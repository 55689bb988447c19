//! Grouped extraction settings.

use crate::classifier::TabularHeuristic;
use crate::dedupe::DedupeOptions;
use crate::lines::LineSettings;
use crate::ruling::RulingSettings;
use crate::words::WordSettings;

/// Every tunable threshold used during extraction, with documented defaults.
///
/// A page carries one `Settings` for its lifetime, so memoized results are
/// always consistent with it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    pub ruling: RulingSettings,
    pub words: WordSettings,
    pub lines: LineSettings,
    pub dedupe: DedupeOptions,
    pub heuristic: TabularHeuristic,
}
