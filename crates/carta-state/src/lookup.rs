//! Lookup paths into a state tree.
//!
//! A lookup is a `/`-separated list of keys. The empty lookup names the root
//! of the tree. Numeric segments index into arrays.

/// Separator between lookup segments.
pub const SEPARATOR: char = '/';

/// Join key parts into a lookup.
///
/// # Examples
///
/// ```
/// use carta_state::lookup;
///
/// assert_eq!(lookup(&["colorMix", "red"]), "colorMix/red");
/// assert_eq!(lookup(&["gamma"]), "gamma");
/// ```
pub fn lookup(parts: &[&str]) -> String {
    parts.join("/")
}

/// Split a lookup into its segments. The root lookup has no segments.
pub fn segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split(SEPARATOR).collect()
    }
}

/// Returns `true` if `a` and `b` are equal or one lies underneath the other.
///
/// Used to decide which callbacks a dirty path triggers: a change to
/// `colorMix/red` concerns subscribers of `colorMix/red`, `colorMix`, and the
/// root, and a change to `colorMix` concerns subscribers of `colorMix/red`.
pub fn is_related(a: &str, b: &str) -> bool {
    is_ancestor_or_self(a, b) || is_ancestor_or_self(b, a)
}

fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
        None => false,
    }
}
