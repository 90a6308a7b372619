/// Query matching strategy. `Auto` picks by trimmed query length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    Exact,
    Prefix,
    Fuzzy,
    #[default]
    Auto,
}

/// Resolve the effective mode: an explicit choice wins, `Auto` (or no
/// choice) maps trimmed length <= 3 to prefix, >= 8 to fuzzy, and
/// everything between to exact.
pub fn resolve_mode(mode: Option<SearchMode>, query: &str) -> SearchMode {
    match mode {
        Some(SearchMode::Auto) | None => {
            let length = query.trim().chars().count();
            if length <= 3 {
                SearchMode::Prefix
            } else if length >= 8 {
                SearchMode::Fuzzy
            } else {
                SearchMode::Exact
            }
        }
        Some(explicit) => explicit,
    }
}

/// Distance used when fuzzy mode is active without an explicit distance.
pub const DEFAULT_FUZZY_DISTANCE: u8 = 2;

/// Effective fuzzy distance: an explicit distance >= 1 always activates
/// expansion; fuzzy mode without one defaults to 2.
pub fn resolve_fuzzy_distance(mode: SearchMode, fuzzy: Option<u8>) -> Option<u8> {
    match fuzzy {
        Some(distance) if distance >= 1 => Some(distance),
        Some(_) => None,
        None if mode == SearchMode::Fuzzy => Some(DEFAULT_FUZZY_DISTANCE),
        None => None,
    }
}
