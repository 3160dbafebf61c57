//! Decides whether a result's owner is the channel being probed.

/// How a candidate owner id matched the target channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerMatch {
    Exact,
    /// Case, a trailing underscore, or a short prefix/suffix differs.
    Fuzzy,
}

/// Matches `candidate` against `target`: exact equality first, then a
/// case-insensitive comparison that ignores trailing underscores, then
/// substring containment when the lengths differ by at most `tolerance`.
#[must_use]
pub fn match_owner(candidate: &str, target: &str, tolerance: usize) -> Option<OwnerMatch> {
    if candidate.is_empty() || target.is_empty() {
        return None;
    }
    if candidate == target {
        return Some(OwnerMatch::Exact);
    }

    let a = candidate.to_lowercase();
    let b = target.to_lowercase();
    let a = a.trim_end_matches('_');
    let b = b.trim_end_matches('_');
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(OwnerMatch::Fuzzy);
    }

    let within_tolerance = a.chars().count().abs_diff(b.chars().count()) <= tolerance;
    if within_tolerance && (a.contains(b) || b.contains(a)) {
        Some(OwnerMatch::Fuzzy)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        assert_eq!(match_owner("robo", "robo", 2), Some(OwnerMatch::Exact));
    }

    #[test]
    fn case_and_underscore_variants_are_fuzzy() {
        assert_eq!(match_owner("Robo_", "robo", 2), Some(OwnerMatch::Fuzzy));
        assert_eq!(match_owner("ROBO", "robo", 2), Some(OwnerMatch::Fuzzy));
    }

    #[test]
    fn containment_respects_length_tolerance() {
        assert_eq!(match_owner("robo42", "robo", 2), Some(OwnerMatch::Fuzzy));
        assert_eq!(match_owner("robotics", "robo", 2), None);
        assert_eq!(match_owner("other", "robo", 2), None);
    }

    #[test]
    fn blank_owner_never_matches() {
        assert_eq!(match_owner("", "robo", 2), None);
        assert_eq!(match_owner("___", "robo", 2), None);
    }
}
