/// Checks if a configuration path matches a given pattern
///
/// # Examples
/// * `"media.blacklisted_players"` matches `"media.blacklisted_players"`
/// * `"media.blacklisted_players"` matches `"media.*"`
/// * `"media.blacklisted_players"` matches `"*"`
pub(super) fn path_matches(path: &str, pattern: &str) -> bool {
    const WILDCARD: &str = "*";

    if pattern == WILDCARD {
        return true;
    };

    let path_parts: Vec<&str> = path.split('.').collect();
    let pattern_parts: Vec<&str> = pattern.split('.').collect();

    if pattern_parts.len() > path_parts.len() {
        return false;
    }

    for (path_part, pattern_part) in path_parts.iter().zip(pattern_parts.iter()) {
        if pattern_part == &WILDCARD {
            continue;
        }

        if path_part != pattern_part {
            return false;
        }
    }

    true
}
