// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Random demo data built from a word list.

use std::ops::RangeInclusive;

use fastrand::Rng;

use crate::{CatalogError, Product};

const DEFAULT_WORDS: &[&str] = &[
    "amber", "anchor", "arch", "aspen", "basket", "beacon", "birch", "blade", "bolt", "bracket", "breeze", "bronze",
    "cable", "canvas", "cedar", "ceramic", "chrome", "clamp", "cobalt", "copper", "cotton", "crystal", "drift",
    "ember", "fabric", "falcon", "flint", "frost", "garnet", "glacier", "granite", "harbor", "hinge", "indigo",
    "ivory", "jade", "kettle", "lantern", "linen", "maple", "marble", "meadow", "nickel", "oak", "onyx", "orchid",
    "pebble", "pewter", "quartz", "ridge", "saddle", "satin", "silver", "slate", "spruce", "steel", "summit",
    "timber", "velvet", "walnut", "willow", "zinc",
];

const NAME_WORDS: RangeInclusive<usize> = 10..=20;
const TEXT_WORDS: RangeInclusive<usize> = 20..=30;

/// The word list demo products are generated from.
///
/// # Examples
///
/// ```
/// use product_catalog::Vocabulary;
///
/// let vocabulary = Vocabulary::from_lines("red\ngreen\n\nblue\n").unwrap();
/// assert_eq!(vocabulary.len(), 3);
///
/// let mut rng = fastrand::Rng::with_seed(7);
/// let product = vocabulary.random_product(&mut rng, 42);
/// assert_eq!(product.sku, "SKU00000042");
/// ```
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|word| (*word).to_string()).collect(),
        }
    }
}

impl Vocabulary {
    /// Creates a vocabulary from `words`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyVocabulary`] if `words` is empty.
    pub fn new(words: Vec<String>) -> Result<Self, CatalogError> {
        if words.is_empty() {
            return Err(CatalogError::EmptyVocabulary);
        }
        Ok(Self { words })
    }

    /// Creates a vocabulary with one word per non-blank line of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyVocabulary`] if `text` has no words.
    pub fn from_lines(text: &str) -> Result<Self, CatalogError> {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Returns the number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; a vocabulary has at least one word.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Picks a random word.
    #[must_use]
    pub fn random_word(&self, rng: &mut Rng) -> &str {
        &self.words[rng.usize(..self.words.len())]
    }

    /// Joins a random number of words, within `words`, with single spaces.
    #[must_use]
    pub fn random_sentence(&self, rng: &mut Rng, words: RangeInclusive<usize>) -> String {
        let count = rng.usize(words);
        let mut sentence = String::new();
        for i in 0..count {
            if i > 0 {
                sentence.push(' ');
            }
            sentence.push_str(self.random_word(rng));
        }
        sentence
    }

    /// Generates product number `index`, with SKU `SKU` followed by the index padded to eight digits.
    #[must_use]
    pub fn random_product(&self, rng: &mut Rng, index: usize) -> Product {
        let mut text = || self.random_sentence(rng, TEXT_WORDS);
        let search_text = text();
        let fields = [text(), text(), text(), text(), text(), text(), text(), text(), text()];
        let [field1, field2, field3, field4, field5, field6, field7, field8, field9] = fields;

        Product {
            sku: format!("SKU{index:08}"),
            name: self.random_sentence(rng, NAME_WORDS),
            search_text,
            field1,
            field2,
            field3,
            field4,
            field5,
            field6,
            field7,
            field8,
            field9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(text: &str) -> usize {
        text.split(' ').count()
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        assert!(matches!(Vocabulary::new(Vec::new()), Err(CatalogError::EmptyVocabulary)));
        assert!(matches!(Vocabulary::from_lines("\n  \n"), Err(CatalogError::EmptyVocabulary)));
    }

    #[test]
    fn products_follow_the_sku_format_and_sentence_lengths() {
        let vocabulary = Vocabulary::default();
        let mut rng = Rng::with_seed(1);

        let product = vocabulary.random_product(&mut rng, 7);

        assert_eq!(product.sku, "SKU00000007");
        assert!(NAME_WORDS.contains(&word_count(&product.name)));
        assert!(TEXT_WORDS.contains(&word_count(&product.search_text)));
        assert!(TEXT_WORDS.contains(&word_count(&product.field9)));
    }

    #[test]
    fn same_seed_generates_the_same_product() {
        let vocabulary = Vocabulary::default();

        let first = vocabulary.random_product(&mut Rng::with_seed(99), 1);
        let second = vocabulary.random_product(&mut Rng::with_seed(99), 1);

        assert_eq!(first, second);
    }

    #[test]
    fn words_come_from_the_vocabulary() {
        let vocabulary = Vocabulary::from_lines("alpha\nbeta").expect("two words");
        let mut rng = Rng::with_seed(3);

        let sentence = vocabulary.random_sentence(&mut rng, 5..=5);

        assert_eq!(word_count(&sentence), 5);
        assert!(sentence.split(' ').all(|word| word == "alpha" || word == "beta"));
    }
}
