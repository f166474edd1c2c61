//! Training exemplars and their ordered store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

/// Normalize an utterance for exact matching: trim, then lowercase.
pub fn normalize_input(text: &str) -> String {
    text.trim().to_lowercase()
}

/// One (input, response) training pair.
///
/// `input` is always stored normalized (see [`normalize_input`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemplar {
    /// Normalized input phrase.
    pub input: String,
    /// Canned response text.
    pub response: String,
}

impl Exemplar {
    /// Validate and normalize a new exemplar.
    pub fn new(input: &str, response: &str) -> Result<Self> {
        let input = normalize_input(input);
        if input.is_empty() {
            return Err(ColloquyError::validation("input must not be empty"));
        }
        if response.trim().is_empty() {
            return Err(ColloquyError::validation("response must not be empty"));
        }

        Ok(Self {
            input,
            response: response.to_string(),
        })
    }
}

/// Result of inserting into an [`ExemplarStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StoreChange {
    /// A new exemplar was appended.
    Inserted,
    /// An existing input got a new response.
    Overwritten {
        /// The response that was replaced.
        previous: String,
    },
    /// The exact same pair was already stored.
    Unchanged,
}

/// Ordered collection of exemplars, at most one per normalized input.
///
/// Insertion order is preserved: overwriting an input keeps its original slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemplarStore {
    exemplars: Vec<Exemplar>,
    positions: HashMap<String, usize>,
}

impl ExemplarStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an exemplar, overwriting the response of an existing input.
    pub fn insert(&mut self, exemplar: Exemplar) -> StoreChange {
        match self.positions.get(&exemplar.input) {
            Some(&pos) => {
                let slot = &mut self.exemplars[pos];
                if slot.response == exemplar.response {
                    StoreChange::Unchanged
                } else {
                    let previous = std::mem::replace(&mut slot.response, exemplar.response);
                    StoreChange::Overwritten { previous }
                }
            }
            None => {
                self.positions
                    .insert(exemplar.input.clone(), self.exemplars.len());
                self.exemplars.push(exemplar);
                StoreChange::Inserted
            }
        }
    }

    /// Response stored for an already normalized input.
    pub fn get(&self, normalized_input: &str) -> Option<&str> {
        self.positions
            .get(normalized_input)
            .map(|&pos| self.exemplars[pos].response.as_str())
    }

    /// Exemplars in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Exemplar> {
        self.exemplars.iter()
    }

    /// Exemplars in insertion order.
    pub fn as_slice(&self) -> &[Exemplar] {
        &self.exemplars
    }

    /// Inputs in insertion order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.exemplars.iter().map(|e| e.input.as_str())
    }

    /// Responses in insertion order (repeats included).
    pub fn responses(&self) -> impl Iterator<Item = &str> {
        self.exemplars.iter().map(|e| e.response.as_str())
    }

    /// Number of stored exemplars.
    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExemplarStore {
    type Item = &'a Exemplar;
    type IntoIter = std::slice::Iter<'a, Exemplar>;

    fn into_iter(self) -> Self::IntoIter {
        self.exemplars.iter()
    }
}
