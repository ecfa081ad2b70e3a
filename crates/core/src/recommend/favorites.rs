//! Two-phase favourites mutation at the caller boundary
//!
//! A change is applied to the local snapshot first, then either confirmed once
//! the store write succeeds or reverted when it fails. Recommendation code only
//! ever reads a snapshot with no pending changes.

use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::item::{ItemId, SavedItem, UserId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq)]
pub enum PendingOperation {
    Save(SavedItem),
    Remove(ItemId),
}

/// Token for a locally applied change awaiting `confirm` or `revert`.
#[derive(Debug, PartialEq)]
#[must_use = "a pending change must be confirmed or reverted"]
pub struct PendingChange {
    id: Uuid,
    operation: PendingOperation,
    /// Item and position displaced by a removal
    removed: Option<(usize, SavedItem)>,
}

impl PendingChange {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> &PendingOperation {
        &self.operation
    }
}

#[derive(Clone, Debug)]
pub struct FavoritesSnapshot {
    user_id: UserId,
    items: Vec<SavedItem>,
    pending: HashSet<Uuid>,
}

impl FavoritesSnapshot {
    pub fn new(user_id: UserId, items: Vec<SavedItem>) -> Self {
        Self { user_id, items, pending: HashSet::new() }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn items(&self) -> &[SavedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.items.iter().any(|saved| &saved.item.id == item_id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn apply_locally(
        &mut self,
        operation: PendingOperation,
    ) -> Result<PendingChange, DomainError> {
        let removed = match &operation {
            PendingOperation::Save(saved) => {
                if saved.user_id != self.user_id {
                    return Err(DomainError::InvariantViolation(format!(
                        "saved item belongs to `{}`, not `{}`",
                        saved.user_id, self.user_id
                    )));
                }
                if self.contains(&saved.item.id) {
                    return Err(DomainError::InvariantViolation(format!(
                        "item `{}` is already saved",
                        saved.item.id
                    )));
                }
                self.items.push(saved.clone());
                None
            }
            PendingOperation::Remove(item_id) => {
                let position = self
                    .items
                    .iter()
                    .position(|saved| &saved.item.id == item_id)
                    .ok_or_else(|| {
                        DomainError::InvariantViolation(format!("item `{item_id}` is not saved"))
                    })?;
                Some((position, self.items.remove(position)))
            }
        };

        let change = PendingChange { id: Uuid::new_v4(), operation, removed };
        self.pending.insert(change.id);
        Ok(change)
    }

    /// Keeps the local change; the store write went through.
    pub fn confirm(&mut self, change: PendingChange) -> Result<(), DomainError> {
        self.settle(&change)
    }

    /// Undoes the local change after a failed store write.
    pub fn revert(&mut self, change: PendingChange) -> Result<(), DomainError> {
        self.settle(&change)?;
        match (change.operation, change.removed) {
            (PendingOperation::Save(saved), _) => {
                self.items.retain(|existing| existing.item.id != saved.item.id);
            }
            (PendingOperation::Remove(_), Some((position, saved))) => {
                let position = position.min(self.items.len());
                self.items.insert(position, saved);
            }
            (PendingOperation::Remove(_), None) => {}
        }
        Ok(())
    }

    fn settle(&mut self, change: &PendingChange) -> Result<(), DomainError> {
        if self.pending.remove(&change.id) {
            Ok(())
        } else {
            Err(DomainError::InvariantViolation(format!(
                "change `{}` is not pending on this snapshot",
                change.id
            )))
        }
    }
}
