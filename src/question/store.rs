//! In-memory question store with optional grouping.

use indexmap::IndexMap;
use tracing::info;

use super::{Question, QuestionDraft};
use crate::error::{QuestionnaireError, Result};

/// Questions keyed by name, plus named groups of question names.
///
/// A question belongs to at most one group. Groups loaded from disk are taken
/// as-is and may name questions the store does not have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionStore {
    questions: IndexMap<String, Question>,
    groups: IndexMap<String, Vec<String>>,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from loaded parts without validation.
    pub fn from_parts(questions: IndexMap<String, Question>, groups: IndexMap<String, Vec<String>>) -> Self {
        Self { questions, groups }
    }

    /// Validates a draft and adds it. Returns the stored name.
    pub fn add(&mut self, draft: QuestionDraft) -> Result<String> {
        let (name, question) = draft.into_question()?;
        if self.insert(name.clone(), question).is_some() {
            info!("Replaced question '{name}'");
        } else {
            info!("Added question '{name}'");
        }
        Ok(name)
    }

    /// Inserts a question without validation. A replaced question keeps its
    /// position and group.
    pub fn insert(&mut self, name: impl Into<String>, question: Question) -> Option<Question> {
        self.questions.insert(name.into(), question)
    }

    /// Removes a question and drops it from its group.
    pub fn remove(&mut self, name: &str) -> Option<Question> {
        let removed = self.questions.shift_remove(name)?;
        self.ungroup(name);
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<&Question> {
        self.questions.get(name)
    }

    /// Looks up a question, failing with the message shown for unknown names.
    pub fn require(&self, name: &str) -> Result<&Question> {
        self.get(name)
            .ok_or_else(|| QuestionnaireError::validation(format!("Unknown question '{name}'.")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.questions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.questions.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Question)> {
        self.questions.iter().map(|(name, q)| (name.as_str(), q))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &IndexMap<String, Question> {
        &self.questions
    }

    pub fn groups(&self) -> &IndexMap<String, Vec<String>> {
        &self.groups
    }

    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Puts a question into a group, creating the group if needed and moving
    /// the question out of any other group.
    pub fn assign_to_group(&mut self, group: &str, name: &str) -> Result<()> {
        if group.trim().is_empty() {
            return Err(QuestionnaireError::validation("Group name is required."));
        }
        self.require(name)?;

        if self.group_of(name) == Some(group) {
            return Ok(());
        }
        self.ungroup(name);

        match self.groups.get_mut(group) {
            Some(members) => members.push(name.to_string()),
            None => {
                self.groups.insert(group.to_string(), vec![name.to_string()]);
            }
        }
        Ok(())
    }

    /// Removes a question from whichever group holds it. Returns false if it
    /// was not grouped.
    pub fn ungroup(&mut self, name: &str) -> bool {
        let mut found = false;
        for members in self.groups.values_mut() {
            let before = members.len();
            members.retain(|member| member != name);
            found |= members.len() != before;
        }
        found
    }

    /// Deletes a group. Its questions stay in the store, ungrouped.
    pub fn remove_group(&mut self, group: &str) -> Option<Vec<String>> {
        self.groups.shift_remove(group)
    }

    pub fn group_members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub fn group_of(&self, name: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == name))
            .map(|(group, _)| group.as_str())
    }

    /// Questions that belong to no group, in store order.
    pub fn ungrouped(&self) -> Vec<&str> {
        self.questions
            .keys()
            .map(String::as_str)
            .filter(|name| self.group_of(name).is_none())
            .collect()
    }
}
