/// Smallest allowed expansion distance.
pub const MIN_FUZZY_DISTANCE: u8 = 1;
/// Largest allowed expansion distance.
pub const MAX_FUZZY_DISTANCE: u8 = 3;

/// Levenshtein distance via Wagner-Fischer restricted to two rolling rows:
/// O(min(|a|,|b|)) space, O(|a|*|b|) time.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Roll over the shorter string to keep the rows small
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut previous: Vec<usize> = (0..=shorter.len()).collect();
    let mut current = vec![0usize; shorter.len() + 1];

    for (i, &long_char) in longer.iter().enumerate() {
        current[0] = i + 1;
        for (j, &short_char) in shorter.iter().enumerate() {
            let cost = if long_char == short_char { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1) // deletion
                .min(current[j] + 1) // insertion
                .min(previous[j] + cost); // substitution
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[shorter.len()]
}

/// All vocabulary terms within `distance` edits of `term`. The distance is
/// capped to `[1, 3]`, the probe is lowercased, and entries whose length
/// differs by more than the cap are skipped without computing a distance.
/// Matches keep the vocabulary's original casing.
pub fn fuzzy_expand<'a>(
    term: &str,
    distance: u8,
    vocabulary: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    let distance = distance.clamp(MIN_FUZZY_DISTANCE, MAX_FUZZY_DISTANCE) as usize;
    let probe = term.to_lowercase();
    let probe_length = probe.chars().count();

    let mut matches = Vec::new();
    for candidate in vocabulary {
        let candidate_length = candidate.chars().count();
        if candidate_length.abs_diff(probe_length) > distance {
            continue;
        }
        if levenshtein(&probe, &candidate.to_lowercase()) <= distance {
            matches.push(candidate.clone());
        }
    }
    matches
}
