use super::PlayerHandle;

/// User-supplied list of players that must never be tracked.
///
/// Entries match a player's desktop entry or identity, ignoring case and an
/// optional `.desktop` suffix on the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    entries: Vec<String>,
}

impl Blacklist {
    /// Build a blacklist from raw configuration entries. Blank entries are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|entry| normalize(entry.as_ref()))
            .filter(|entry| !entry.is_empty())
            .collect();

        Self { entries }
    }

    /// Whether no player can match.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a player with these names is blacklisted.
    pub fn matches(&self, desktop_entry: &str, identity: &str) -> bool {
        if self.entries.is_empty() {
            return false;
        }

        let desktop_entry = normalize(desktop_entry);
        let identity = identity.trim().to_lowercase();

        self.entries.iter().any(|entry| {
            (!desktop_entry.is_empty() && *entry == desktop_entry)
                || (!identity.is_empty() && *entry == identity)
        })
    }

    /// Whether an initialized player is blacklisted.
    pub fn contains(&self, player: &PlayerHandle) -> bool {
        self.matches(&player.desktop_entry(), &player.identity())
    }
}

fn normalize(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_suffix(".desktop").unwrap_or(name);
    name.to_lowercase()
}
