//! Caller-owned collection of quotes

use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::quote::{QuoteId, QuoteRecord};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Category filter value meaning "no filter".
pub const ALL_CATEGORIES: &str = "all";

const SEED_QUOTES: [(&str, &str); 3] = [
    (
        "The best way to get started is to quit talking and begin doing.",
        "Motivation",
    ),
    (
        "Success is not the key to happiness. Happiness is the key to success.",
        "Success",
    ),
    ("In the middle of every difficulty lies opportunity.", "Wisdom"),
];

/// Ordered set of quotes, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteSet {
    quotes: Vec<QuoteRecord>,
}

impl QuoteSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { quotes: Vec::new() }
    }

    /// Build a set from records, keeping the first record for any repeated id
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = QuoteRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            let id = record.id.clone();
            if !set.push(record) {
                tracing::warn!("Dropping duplicate quote id {id}");
            }
        }
        set
    }

    /// Default quotes for a fresh collection
    #[must_use]
    pub fn seeded(now: i64) -> Self {
        Self::from_records(
            SEED_QUOTES
                .iter()
                .map(|(text, category)| QuoteRecord::new_local(*text, *category, now)),
        )
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuoteRecord> {
        self.quotes.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<QuoteRecord> {
        self.quotes
    }

    pub fn contains(&self, id: &QuoteId) -> bool {
        self.quotes.iter().any(|quote| &quote.id == id)
    }

    pub fn get(&self, id: &QuoteId) -> Option<&QuoteRecord> {
        self.quotes.iter().find(|quote| &quote.id == id)
    }

    pub fn get_mut(&mut self, id: &QuoteId) -> Option<&mut QuoteRecord> {
        self.quotes.iter_mut().find(|quote| &quote.id == id)
    }

    /// Position of the first quote whose text matches case-insensitively
    pub fn position_by_text(&self, text: &str) -> Option<usize> {
        self.quotes.iter().position(|quote| quote.text_matches(text))
    }

    /// Append a record; returns `false` and leaves the set untouched when the
    /// id is already present.
    pub fn push(&mut self, record: QuoteRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.quotes.push(record);
        true
    }

    /// Add a user-authored quote after trimming both fields
    pub fn add_quote(&mut self, text: &str, category: &str, now: i64) -> Result<&QuoteRecord> {
        let text = normalize_text_option(Some(text.to_string()))
            .ok_or_else(|| Error::InvalidInput("quote text must not be empty".into()))?;
        let category = normalize_text_option(Some(category.to_string()))
            .ok_or_else(|| Error::InvalidInput("quote category must not be empty".into()))?;

        self.quotes
            .push(QuoteRecord::new_local(text, category, now));
        let index = self.quotes.len() - 1;
        Ok(&self.quotes[index])
    }

    /// Drop conflict provenance left over from an earlier merge
    pub fn clear_backups(&mut self) -> usize {
        let mut cleared = 0;
        for quote in &mut self.quotes {
            if quote.backup.take().is_some() {
                cleared += 1;
            }
        }
        cleared
    }

    /// Sorted unique categories
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.quotes
            .iter()
            .map(|quote| quote.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Quotes in `category`; `None` or [`ALL_CATEGORIES`] selects everything
    #[must_use]
    pub fn filter_by_category(&self, category: Option<&str>) -> Vec<&QuoteRecord> {
        match category.filter(|category| *category != ALL_CATEGORIES) {
            Some(category) => self
                .quotes
                .iter()
                .filter(|quote| quote.category == category)
                .collect(),
            None => self.quotes.iter().collect(),
        }
    }

    /// Uniformly pick a quote from the filtered pool
    pub fn random_quote<R: Rng + ?Sized>(
        &self,
        category: Option<&str>,
        rng: &mut R,
    ) -> Option<&QuoteRecord> {
        self.filter_by_category(category).choose(rng).copied()
    }
}

impl Index<usize> for QuoteSet {
    type Output = QuoteRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.quotes[index]
    }
}

impl IndexMut<usize> for QuoteSet {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.quotes[index]
    }
}

impl<'a> IntoIterator for &'a QuoteSet {
    type Item = &'a QuoteRecord;
    type IntoIter = std::slice::Iter<'a, QuoteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.quotes.iter()
    }
}
