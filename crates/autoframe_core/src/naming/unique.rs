//! Collision-free names within a batch.

use std::collections::HashSet;

use super::policy::{is_separator, split_extension, MAX_NAME_LEN};

/// Tracks filenames already handed out in one batch.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with names that already exist (e.g. files in the output folder).
    pub fn with_existing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Reserve `candidate`, or the first free `stem__NNN.ext` variant.
    /// Numbered variants stay within [`MAX_NAME_LEN`].
    pub fn ensure_unique(&mut self, candidate: &str) -> String {
        if self.used.insert(candidate.to_string()) {
            return candidate.to_string();
        }
        let (stem, ext) = split_extension(candidate);
        let mut counter: u32 = 1;
        loop {
            let suffix = format!("__{:03}", counter);
            let room = MAX_NAME_LEN.saturating_sub(suffix.len() + ext.len()).max(1);
            let variant = format!("{}{}{}", capped_stem(stem, room), suffix, ext);
            if self.used.insert(variant.clone()) {
                return variant;
            }
            counter += 1;
        }
    }
}

/// `stem` cut to at most `room` bytes on a char boundary, without trailing separators.
fn capped_stem(stem: &str, room: usize) -> &str {
    if stem.len() <= room {
        return stem;
    }
    let mut end = room;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let cut = stem[..end].trim_end_matches(is_separator);
    if cut.is_empty() {
        &stem[..end]
    } else {
        cut
    }
}
