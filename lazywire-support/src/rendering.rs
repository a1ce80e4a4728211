//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution trails, type names,
//! and "did you mean?" hints in error output.

/// Separator placed between names of a rendered trail.
pub const TRAIL_SEPARATOR: &str = " -> ";

/// Renders a resolution trail as a readable string.
///
/// # Examples
/// ```
/// use lazywire_support::rendering::render_chain;
///
/// let chain = vec!["a", "b", "c", "d", "b"];
/// assert_eq!(render_chain(&chain), "a -> b -> c -> d -> b");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(TRAIL_SEPARATOR)
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use lazywire_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let is_delimiter = |c: char| "<>,()[]; &".contains(c);

    let mut out = String::with_capacity(full_name.len());
    let mut rest = full_name;
    while !rest.is_empty() {
        let split = rest.find(is_delimiter).unwrap_or(rest.len());
        let (path, tail) = rest.split_at(split);
        out.push_str(path.rsplit("::").next().unwrap_or(path));

        let mut tail_chars = tail.chars();
        if let Some(delimiter) = tail_chars.next() {
            out.push(delimiter);
        }
        rest = tail_chars.as_str();
    }
    out
}

/// Quick "close enough" check between two names.
///
/// Not a full edit distance: lengths may differ by at most 3 and
/// at least 60% of the aligned characters must agree.
pub fn is_close(a: &str, b: &str) -> bool {
    let len_diff = a.len().abs_diff(b.len());
    if len_diff > 3 {
        return false;
    }

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return true;
    }

    let common = a
        .chars()
        .zip(b.chars())
        .filter(|(ca, cb)| ca == cb)
        .count();

    common * 100 / max_len >= 60
}

/// Suggests registered names that look like a misspelling of `requested`.
///
/// Matches are ranked: substring hits first, then near-typos, then names
/// sharing a prefix of at least three characters. Exact matches are skipped.
pub fn suggest_similar<S: AsRef<str>>(
    requested: &str,
    available: &[S],
    max_suggestions: usize,
) -> Vec<String> {
    if requested.is_empty() || max_suggestions == 0 {
        return Vec::new();
    }

    let requested_lower = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|name| {
            let name: &str = name.as_ref();
            if name == requested || name.is_empty() {
                return None;
            }

            let name_lower = name.to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if is_close(&name_lower, &requested_lower) {
                return Some((name, 90));
            }

            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    // stable order for equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
