//! Tag aggregation.

use super::post::PostEntry;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub count: usize,
}

/// Count tag names, sorted alphabetically.
pub fn count_tags<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Tag> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| Tag {
            name: name.to_owned(),
            count,
        })
        .collect()
}

/// Tags of every post, counted.
pub fn get_tags(posts: &[PostEntry]) -> Vec<Tag> {
    count_tags(
        posts
            .iter()
            .flat_map(|post| post.options.tags.iter().map(|tag| tag.name.as_str())),
    )
}
