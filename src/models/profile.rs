//! Profile model for the site owner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The site owner's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub location: String,
    pub email: String,
    pub avatar_url: String,
    /// Network name to URL; an empty URL means the link is not set
    #[serde(default)]
    pub socials: BTreeMap<String, String>,
}

impl Profile {
    /// Social links that are actually set.
    pub fn social_links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.socials
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(network, url)| (network.as_str(), url.as_str()))
    }
}
