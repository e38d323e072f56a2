//! Tab name generation

/// Prefix shared by all composer tab names
pub const TAB_PREFIX: &str = "prompt-";

/// Lowest-numbered `prompt-<n>` not present in `existing`
///
/// Gaps left by deleted tabs are filled first, so deleting `prompt-2` from
/// `{prompt-1, prompt-2, prompt-3}` makes the next name `prompt-2` again.
pub fn next_tab_name<S: AsRef<str>>(existing: &[S]) -> String {
    let used: Vec<usize> = existing
        .iter()
        .filter_map(|name| name.as_ref().strip_prefix(TAB_PREFIX)?.parse().ok())
        .collect();

    let n = (1..).find(|n| !used.contains(n)).unwrap_or(1);
    format!("{}{}", TAB_PREFIX, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let none: [&str; 0] = [];
        assert_eq!(next_tab_name(&none), "prompt-1");
    }

    #[test]
    fn test_fills_lowest_gap() {
        assert_eq!(next_tab_name(&["prompt-1", "prompt-3"]), "prompt-2");
        assert_eq!(next_tab_name(&["prompt-2", "prompt-3"]), "prompt-1");
    }

    #[test]
    fn test_appends_after_contiguous_run() {
        assert_eq!(
            next_tab_name(&["prompt-1", "prompt-2", "prompt-3"]),
            "prompt-4"
        );
    }

    #[test]
    fn test_ignores_foreign_names() {
        assert_eq!(next_tab_name(&["notes", "prompt-x", "prompt-1"]), "prompt-2");
    }
}
