//! Review of the todos left unfinished yesterday.
//!
//! The user ticks the ones they actually finished; `complete_marked` reports
//! each to the server and, once all succeed, records in the session that the
//! review has been seen.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::ApiError;
use crate::remote::TodoRemote;
use crate::session::SessionState;
use crate::types::{TodoId, YesterdayItem};

pub struct YesterdayReview<R> {
    remote: Arc<R>,
    session: Arc<SessionState>,
    items: Vec<YesterdayItem>,
    marked: Vec<TodoId>,
}

impl<R: TodoRemote> YesterdayReview<R> {
    pub fn new(remote: Arc<R>, session: Arc<SessionState>) -> Self {
        Self {
            remote,
            session,
            items: Vec::new(),
            marked: Vec::new(),
        }
    }

    pub fn items(&self) -> &[YesterdayItem] {
        &self.items
    }

    pub fn marked(&self) -> &[TodoId] {
        &self.marked
    }

    /// Replace the list with one page from the server. Errors are logged and
    /// leave the current list in place.
    pub async fn load(&mut self, page: u32, size: u32) {
        match self.remote.yesterday_list(page, size).await {
            Ok(response) => self.items = response.yesterdays,
            Err(err) => error!(error = %err, "failed to load yesterday list"),
        }
    }

    /// Tick or untick `id`. Ticks keep their order.
    pub fn toggle_marked(&mut self, id: TodoId) {
        match self.marked.iter().position(|&m| m == id) {
            Some(index) => {
                self.marked.remove(index);
            }
            None => self.marked.push(id),
        }
    }

    /// Send a completion for every ticked todo, stopping at the first
    /// failure with the ticks left intact.
    pub async fn complete_marked(&mut self) -> Result<(), ApiError> {
        for &id in &self.marked {
            if let Err(err) = self.remote.toggle_completion(id).await {
                error!(todo_id = id, error = %err, "failed to complete yesterday todo");
                return Err(err);
            }
        }
        info!(count = self.marked.len(), "yesterday review completed");
        self.session.mark_yesterday_seen();
        self.marked.clear();
        Ok(())
    }
}
