//! Response text to label-id numbering.

use std::collections::{BTreeMap, HashMap};

use crate::config::LabelPolicy;
use crate::ml::classifier::LabelId;

/// Labels assigned during one training pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelAssignment {
    /// Label of each exemplar, parallel to the exemplar order.
    pub labels: Vec<LabelId>,
    /// Reverse map for the labels present in this pass.
    pub responses: BTreeMap<LabelId, String>,
}

impl LabelAssignment {
    /// Number of distinct responses in the pass.
    pub fn distinct(&self) -> usize {
        self.responses.len()
    }
}

/// Assigns integer ids to distinct response texts.
///
/// Under [`LabelPolicy::Stable`] a response keeps its id across passes, so ids
/// cached anywhere stay meaningful after a retrain. Under
/// [`LabelPolicy::PerRetrain`] every pass numbers responses from 0 in
/// first-seen order.
#[derive(Debug, Clone)]
pub struct LabelRegistry {
    policy: LabelPolicy,
    ids: HashMap<String, LabelId>,
    responses: Vec<String>,
}

impl LabelRegistry {
    /// Create an empty registry.
    pub fn new(policy: LabelPolicy) -> Self {
        Self {
            policy,
            ids: HashMap::new(),
            responses: Vec::new(),
        }
    }

    /// Get the numbering policy.
    pub fn policy(&self) -> LabelPolicy {
        self.policy
    }

    /// Label every response of a training pass, in order.
    pub fn assign<'a, I>(&mut self, responses: I) -> LabelAssignment
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.policy == LabelPolicy::PerRetrain {
            self.ids.clear();
            self.responses.clear();
        }

        let mut assignment = LabelAssignment::default();
        for response in responses {
            let label = self.id_for(response);
            assignment.labels.push(label);
            assignment
                .responses
                .entry(label)
                .or_insert_with(|| response.to_string());
        }
        assignment
    }

    /// Id of `response`, registering it if unseen.
    fn id_for(&mut self, response: &str) -> LabelId {
        if let Some(&id) = self.ids.get(response) {
            return id;
        }
        let id = self.responses.len() as LabelId;
        self.ids.insert(response.to_string(), id);
        self.responses.push(response.to_string());
        id
    }

    /// Look up the id of a registered response.
    pub fn get(&self, response: &str) -> Option<LabelId> {
        self.ids.get(response).copied()
    }

    /// Number of responses ever registered (since the last reset for
    /// per-retrain numbering).
    pub(crate) fn len(&self) -> usize {
        self.responses.len()
    }
}
