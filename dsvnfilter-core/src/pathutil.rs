//! Component-wise path helpers shared by the matcher, synthesizer and untangler.
//!
//! Paths inside a dump stream are repository-relative and never carry a
//! leading slash in their canonical form, but input may. Everything here
//! normalizes around a slash-free, non-empty-component representation.

/// Splits a path into its non-empty components, ignoring a leading or
/// trailing slash.
pub fn components(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect()
}

/// Re-joins a path's components with single slashes, dropping empties.
pub fn normalize(path: &str) -> String {
    components(path).join("/")
}

/// Joins a parent path and a single child component.
pub fn join(parent: &str, child: &str) -> String {
    let p = normalize(parent);
    if p.is_empty() {
        child.to_string()
    } else {
        format!("{p}/{child}")
    }
}

/// True if `prefix`'s components are a component-wise prefix of `path`'s,
/// i.e. `a/b` matches `a/b`, `a/b/c`, but not `a/bc`.
pub fn is_component_prefix(prefix: &[&str], path: &[&str]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path.iter()).all(|(a, b)| a == b)
}
