//! Star-name canonicalisation used by the name fallback of the matcher.

use crate::constants::{CANDIDATE_SUFFIXES, PLANET_DESIGNATIONS};

/// Lower-case and drop every whitespace and hyphen character.
///
/// `"HD-209 458"`, `"hd 209458"` and `"HD209458"` all normalise to `"hd209458"`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Turn a planet name into its host star name.
///
/// Removes a trailing `" b"` style designation, or else a trailing `.01`/`.02`/`.2`
/// candidate suffix. At most one rule applies; other names come back unchanged.
pub fn strip_designation(name: &str) -> &str {
    for letter in PLANET_DESIGNATIONS {
        if let Some(host) = name.strip_suffix(*letter).and_then(|s| s.strip_suffix(' ')) {
            return host;
        }
    }
    for suffix in CANDIDATE_SUFFIXES {
        if let Some(host) = name.strip_suffix(suffix) {
            return host;
        }
    }
    name
}
