//! Remote name collision resolution

/// Pick a name for an upload that does not collide with `existing`.
///
/// Returns `desired` unchanged when it is free, otherwise the first of
/// `"<desired> (1)"`, `"<desired> (2)"`, ... that is not taken, e.g.
/// `film.mp4 (2)`.
pub fn resolve(desired: &str, existing: &[String]) -> String {
    if !existing.iter().any(|n| n == desired) {
        return desired.to_string();
    }

    let mut i = 1u64;
    loop {
        let candidate = format!("{desired} ({i})");
        if !existing.iter().any(|n| *n == candidate) {
            return candidate;
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_free_name_is_unchanged() {
        assert_eq!(resolve("film.mp4", &names(&["other.txt"])), "film.mp4");
        assert_eq!(resolve("film.mp4", &[]), "film.mp4");
    }

    #[test]
    fn test_first_collision() {
        assert_eq!(resolve("t", &names(&["t"])), "t (1)");
    }

    #[test]
    fn test_skips_taken_disambiguators() {
        assert_eq!(resolve("file", &names(&["file", "file (1)"])), "file (2)");
        assert_eq!(
            resolve("file", &names(&["file", "file (1)", "file (2)", "file (3)"])),
            "file (4)"
        );
    }

    #[test]
    fn test_gap_in_disambiguators_is_used() {
        assert_eq!(resolve("file", &names(&["file", "file (2)"])), "file (1)");
    }

    #[test]
    fn test_result_never_collides() {
        let existing = names(&["a", "a (1)", "a (2)", "b"]);
        let chosen = resolve("a", &existing);
        assert!(!existing.contains(&chosen));
    }
}
