//! Review session collaborator backed by the SQLite database.
use super::db;
use crate::error::{AppError, Result};
use crate::models::{ItemId, Quality, ReviewCollaborator, ReviewQueueItem, ScheduleState};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Persists ratings as they happen and remembers what the session is showing.
pub struct SqliteReviewStore {
    conn: Arc<Mutex<Connection>>,
    highlighted: Option<usize>,
    current_item: Option<ItemId>,
    stored: HashMap<ItemId, ScheduleState>,
}

impl SqliteReviewStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            highlighted: None,
            current_item: None,
            stored: HashMap::new(),
        }
    }

    /// Association index to highlight in the story illustration.
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn current_item(&self) -> Option<&ItemId> {
        self.current_item.as_ref()
    }

    /// Schedule written for the item during this session, if it was rated.
    pub fn stored_schedule(&self, item_id: &ItemId) -> Option<&ScheduleState> {
        self.stored.get(item_id)
    }
}

impl ReviewCollaborator for SqliteReviewStore {
    fn update_schedule(&mut self, item_id: &ItemId, quality: Quality) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        let next = db::update_schedule(item_id, quality, &conn)?;
        debug!(item = %item_id, next_due_at = %next.next_due_at, "rating stored");
        self.stored.insert(item_id.clone(), next);
        Ok(())
    }

    fn set_highlighted(&mut self, association_index: Option<usize>) {
        self.highlighted = association_index;
        if association_index.is_none() {
            self.current_item = None;
        }
    }

    fn on_current_item_change(&mut self, item: &ReviewQueueItem) {
        self.current_item = Some(item.item_id.clone());
    }
}
