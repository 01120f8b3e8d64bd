use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::errors::{Error, Result};

/// Field delimiter between a token and its tag.
pub const DELIMITER: char = '\t';

/// A sentence paired with its gold tags.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaggedSentence {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

impl TaggedSentence {
    pub fn new<T, S>(tokens: &[T], tags: &[S]) -> Result<Self>
    where
        T: AsRef<str>,
        S: AsRef<str>,
    {
        if tokens.len() != tags.len() {
            return Err(Error::MalformedExample {
                index: 0,
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        Ok(Self {
            tokens: tokens.iter().map(|s| s.as_ref().to_string()).collect(),
            tags: tags.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }

    pub fn push(&mut self, token: &str, tag: &str) {
        self.tokens.push(token.to_string());
        self.tags.push(tag.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Fails if the token and tag columns disagree in length.
    pub(crate) fn check(&self, index: usize) -> Result<()> {
        if self.tokens.len() != self.tags.len() {
            return Err(Error::MalformedExample {
                index,
                tokens: self.tokens.len(),
                tags: self.tags.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Dataset {
    pub seqs: Vec<TaggedSentence>,
}

impl Dataset {
    /// Reads `token<TAB>tag` lines; blank lines separate sentences.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut ds = Dataset::default();
        for line in reader.lines() {
            ds.read_line(&line?);
        }
        ds.finish();
        Ok(ds)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::try_from(File::open(path)?)
    }

    /// Partial sentence being accumulated lives at the end of `seqs`.
    fn read_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            if self.seqs.last().map_or(false, |s| !s.is_empty()) {
                self.seqs.push(TaggedSentence::default());
            }
            return;
        }
        let mut fields = line.split(DELIMITER);
        if let (Some(token), Some(tag)) = (fields.next(), fields.next()) {
            if self.seqs.is_empty() {
                self.seqs.push(TaggedSentence::default());
            }
            if let Some(seq) = self.seqs.last_mut() {
                seq.push(token.trim(), tag.trim());
            }
        } else {
            log::warn!("invalid line: {line}");
        }
    }

    fn finish(&mut self) {
        if self.seqs.last().map_or(false, TaggedSentence::is_empty) {
            self.seqs.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedSentence> {
        self.seqs.iter()
    }

    pub fn max_length(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn num_tokens(&self) -> usize {
        self.seqs.iter().map(|x| x.len()).sum()
    }

    /// Distinct tags in sorted order.
    pub fn tags(&self) -> Vec<&str> {
        self.seqs
            .iter()
            .flat_map(|s| s.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn extend(&mut self, other: Dataset) {
        self.seqs.extend(other.seqs);
    }
}

impl TryFrom<File> for Dataset {
    type Error = Error;

    fn try_from(value: File) -> Result<Self> {
        Self::from_reader(BufReader::new(value))
    }
}

impl<'a> From<std::str::Lines<'a>> for Dataset {
    fn from(lines: std::str::Lines<'a>) -> Self {
        let mut ds = Dataset::default();
        lines.for_each(|line| ds.read_line(line));
        ds.finish();
        ds
    }
}

impl IntoIterator for Dataset {
    type Item = TaggedSentence;
    type IntoIter = std::vec::IntoIter<TaggedSentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.seqs.into_iter()
    }
}
