//! Pure chain helpers. Nothing here allocates state or fails.
//!
//! Segments are separated by [`CHAIN_SEPARATOR`] and trimmed of surrounding
//! whitespace when a chain is split, so `"a . b"` and `"a.b"` address the
//! same location.

/// Separator between chain segments.
pub const CHAIN_SEPARATOR: &str = ".";

/// Chain that every "observe everything" subscriber listens on.
pub const WILDCARD: &str = "*";

/// Append `segment` to `parent`.
///
/// Returns just `segment` when `parent` is empty, so extending the root chain
/// never produces a leading separator.
///
/// # Examples
///
/// ```
/// use bindable_chain::extend;
///
/// assert_eq!(extend("", "a"), "a");
/// assert_eq!(extend("a", "b"), "a.b");
/// assert_eq!(extend("items", 2), "items.2");
/// ```
pub fn extend(parent: &str, segment: impl std::fmt::Display) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}{CHAIN_SEPARATOR}{segment}")
    }
}

/// Split a chain into trimmed segments.
///
/// The empty chain yields a single empty segment, matching how a plain
/// string split behaves; callers that treat the empty chain as the root check
/// for it before splitting.
pub fn segments(chain: &str) -> Vec<&str> {
    chain.split(CHAIN_SEPARATOR).map(str::trim).collect()
}

/// Every cumulative prefix of the trimmed segment sequence, root to leaf.
///
/// ```
/// use bindable_chain::prefixes;
///
/// assert_eq!(prefixes("a.b.2"), vec!["a", "a.b", "a.b.2"]);
/// ```
pub fn prefixes(chain: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for (i, segment) in segments(chain).into_iter().enumerate() {
        if i != 0 {
            current.push_str(CHAIN_SEPARATOR);
        }
        current.push_str(segment);
        out.push(current.clone());
    }
    out
}

/// Returns `true` if `candidate` starts with `chain` as a literal string.
///
/// This is a plain string comparison, not a segment comparison: `"a.b"` is
/// a prefix of both `"a.b.c"` and `"a.bc"`.
pub fn is_prefix_of(chain: &str, candidate: &str) -> bool {
    candidate.starts_with(chain)
}
