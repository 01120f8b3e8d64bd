use serde::{Deserialize, Serialize};

use super::feature::START_TAG;
use crate::quark::{Quark, StringTable};

/// Output tags with dense ids in `[0, T)`; the start sentinel takes id `T`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagVocabulary {
    tags: Quark,
}

impl TagVocabulary {
    /// Distinct tags are numbered in sorted order.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: Quark::sorted(tags.into_iter().filter(|t| t.as_ref() != START_TAG)),
        }
    }

    /// Id of the start sentinel.
    pub fn start(&self) -> usize {
        self.tags.len()
    }

    /// Name of a previous-tag id, the sentinel included.
    pub fn previous_str(&self, id: usize) -> Option<&str> {
        if id == self.start() {
            Some(START_TAG)
        } else {
            self.tags.to_str(id)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter()
    }

    /// Maps ids back to tag names.
    pub fn decode(&self, ids: &[usize]) -> Vec<String> {
        ids.iter()
            .filter_map(|&id| self.tags.to_str(id))
            .map(str::to_string)
            .collect()
    }
}

impl StringTable for TagVocabulary {
    fn to_str(&self, id: usize) -> Option<&str> {
        self.tags.to_str(id)
    }

    fn to_id(&self, s: &str) -> Option<usize> {
        self.tags.to_id(s)
    }

    fn len(&self) -> usize {
        self.tags.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_not_an_output_tag() {
        let vocab = TagVocabulary::new(["WP", "VBZ", "<s>", "JJ", "."]);
        assert_eq!(vocab.len(), 4);
        assert_eq!(vocab.start(), 4);
        assert_eq!(vocab.to_id(START_TAG), None);
        assert_eq!(vocab.previous_str(4), Some(START_TAG));
        assert_eq!(vocab.previous_str(1), Some("JJ"));
        assert_eq!(vocab.previous_str(5), None);
    }

    #[test]
    fn decode_ids() {
        let vocab = TagVocabulary::new(["b", "a"]);
        assert_eq!(vocab.decode(&[1, 0, 1]), vec!["b", "a", "b"]);
    }
}
