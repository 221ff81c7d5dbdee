//! Today-list store with optimistic updates.
//!
//! # Design
//! `TodayListStore` is an actor: one task owns the list, the rollback
//! snapshot, the selected item and the drag controller. Handles send
//! commands over an mpsc channel. Remote calls run on their own tasks and
//! post a completion back into the actor, so every mutation and snapshot
//! capture happens on the actor task while several calls can be in flight.
//!
//! Failure policy differs per operation. Completion toggles and swipes roll
//! back. Order persistence, deletes and bookmark or deadline edits only log.
//! Repeat toggles apply on success only.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::error::{ApiError, StoreClosed};
use crate::remote::{ReqwestTransport, TodoRemote, TodoService};
use crate::reorder::{DropOutcome, ReorderController};
use crate::session::Clock;
use crate::types::{TodayItem, TodayListResponse, TodayStatus, TodoId, TODAY_ORDER_TYPE};

/// Page size requested when loading the today list.
pub const TODAY_PAGE_SIZE: u32 = 50;

const COMMAND_BUFFER: usize = 64;

/// What observers of the store see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodayView {
    pub items: Vec<TodayItem>,
    pub selected: Option<TodayItem>,
}

/// Synchronous list state owned by the actor.
#[derive(Debug, Default)]
struct TodayState {
    items: Vec<TodayItem>,
    snapshot: Vec<TodayItem>,
    selected: Option<TodayItem>,
}

impl TodayState {
    fn position(&self, id: TodoId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    fn item_mut(&mut self, id: TodoId) -> Option<&mut TodayItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn replace(&mut self, items: Vec<TodayItem>) {
        self.snapshot = items.clone();
        self.items = items;
    }

    /// Flip the status of `id` and move it: completed items go to the end,
    /// reopened items go right after the last open one. Returns the list as
    /// it was before, or `None` if `id` is not on the list.
    fn toggle_completion(&mut self, id: TodoId) -> Option<Vec<TodayItem>> {
        let index = self.position(id)?;
        let previous = self.items.clone();

        let mut item = self.items.remove(index);
        item.status = item.status.toggled();
        match item.status {
            TodayStatus::Completed => self.items.push(item),
            TodayStatus::Incomplete => {
                let at = self
                    .items
                    .iter()
                    .rposition(|i| i.status == TodayStatus::Incomplete)
                    .map_or(0, |last| last + 1);
                self.items.insert(at, item);
            }
        }
        Some(previous)
    }

    fn remove(&mut self, id: TodoId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    fn incomplete_ids(&self) -> Vec<TodoId> {
        self.items
            .iter()
            .filter(|item| !item.is_completed())
            .map(|item| item.id)
            .collect()
    }

    fn view(&self) -> TodayView {
        TodayView {
            items: self.items.clone(),
            selected: self.selected.clone(),
        }
    }
}

/// Signal sent back to the handle once a command has been reconciled.
enum Reply {
    Done(oneshot::Sender<()>),
    Dropped(oneshot::Sender<DropOutcome>),
}

impl Reply {
    fn send(self) {
        match self {
            Reply::Done(tx) => {
                let _ = tx.send(());
            }
            Reply::Dropped(tx) => {
                let _ = tx.send(DropOutcome::Reordered);
            }
        }
    }
}

enum Command {
    Load(Reply),
    ToggleCompletion(TodoId, Reply),
    Defer(TodoId, Reply),
    Dismiss(TodoId, Reply),
    PersistOrder(Reply),
    Remove(TodoId, Reply),
    ToggleBookmark(TodoId, Reply),
    UpdateDeadline(TodoId, Option<NaiveDate>, Reply),
    ToggleRepeat(TodoId, Reply),
    Select(TodoId, oneshot::Sender<bool>),
    ClearSelection(Reply),
    PickUp(usize, oneshot::Sender<bool>),
    Hover(usize, oneshot::Sender<bool>),
    Drop(oneshot::Sender<DropOutcome>),
    CancelDrag(Reply),
}

enum Completion {
    Loaded(Result<TodayListResponse, ApiError>),
    Completion {
        id: TodoId,
        previous: Vec<TodayItem>,
        result: Result<(), ApiError>,
    },
    Deferred(TodoId, Result<(), ApiError>),
    OrderPersisted(Result<(), ApiError>),
    Removed(TodoId, Result<(), ApiError>),
    Bookmarked(TodoId, Result<(), ApiError>),
    DeadlineUpdated(TodoId, Option<NaiveDate>, Result<(), ApiError>),
    RepeatToggled(TodoId, Result<(), ApiError>),
}

/// The actor. Construct it with `spawn` and talk to it through the handle.
pub struct TodayListStore<R> {
    remote: Arc<R>,
    clock: Arc<dyn Clock>,
    page_size: u32,
    state: TodayState,
    reorder: ReorderController<TodoId>,
    view: watch::Sender<TodayView>,
    completions: mpsc::UnboundedSender<(Completion, Reply)>,
}

impl<R: TodoRemote + 'static> TodayListStore<R> {
    /// Start the actor on the current tokio runtime.
    pub fn spawn(remote: Arc<R>, clock: Arc<dyn Clock>, page_size: u32) -> TodayListHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(TodayView::default());

        let store = Self {
            remote,
            clock: Arc::clone(&clock),
            page_size,
            state: TodayState::default(),
            reorder: ReorderController::new(),
            view: view_tx,
            completions: completions_tx,
        };
        tokio::spawn(store.run(commands_rx, completions_rx));

        TodayListHandle {
            commands: commands_tx,
            view: view_rx,
            clock,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<(Completion, Reply)>,
    ) {
        loop {
            tokio::select! {
                Some((completion, reply)) = completions.recv() => {
                    self.reconcile(completion);
                    self.reply(reply);
                }
                command = commands.recv() => match command {
                    Some(command) => {
                        self.handle(command);
                        self.publish();
                    }
                    None => break,
                },
            }
        }
        debug!("today list store stopped");
    }

    fn publish(&self) {
        let view = self.state.view();
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }

    /// Publish first so a caller woken by the reply sees the new state.
    fn reply(&self, reply: Reply) {
        self.publish();
        reply.send();
    }

    fn answer<T>(&self, tx: oneshot::Sender<T>, value: T) {
        self.publish();
        let _ = tx.send(value);
    }

    /// Run `call` against the remote off the actor task and feed the result
    /// back through `finish`.
    fn dispatch<F, Fut, T>(&self, reply: Reply, call: F, finish: impl FnOnce(Result<T, ApiError>) -> Completion + Send + 'static)
    where
        F: FnOnce(Arc<R>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
    {
        let remote = Arc::clone(&self.remote);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = call(remote).await;
            let _ = completions.send((finish(result), reply));
        });
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Load(reply) => {
                let page_size = self.page_size;
                self.dispatch(
                    reply,
                    move |remote| async move { remote.today_list(0, page_size).await },
                    Completion::Loaded,
                );
            }
            Command::ToggleCompletion(id, reply) => {
                let Some(previous) = self.state.toggle_completion(id) else {
                    debug!(todo_id = id, "completion toggle for unknown todo ignored");
                    self.reply(reply);
                    return;
                };
                self.dispatch(
                    reply,
                    move |remote| async move { remote.toggle_completion(id).await },
                    move |result| Completion::Completion { id, previous, result },
                );
            }
            Command::Defer(id, reply) => {
                self.state.snapshot = self.state.items.clone();
                self.dispatch(
                    reply,
                    move |remote| async move { remote.swipe(id).await },
                    move |result| Completion::Deferred(id, result),
                );
            }
            Command::Dismiss(id, reply) => {
                self.state.remove(id);
                self.reply(reply);
            }
            Command::PersistOrder(reply) => self.persist_order(reply),
            Command::Remove(id, reply) => {
                self.state.remove(id);
                self.dispatch(
                    reply,
                    move |remote| async move { remote.delete_todo(id).await },
                    move |result| Completion::Removed(id, result),
                );
            }
            Command::ToggleBookmark(id, reply) => {
                if let Some(selected) = self.state.selected.as_mut() {
                    selected.is_bookmark = !selected.is_bookmark;
                }
                self.dispatch(
                    reply,
                    move |remote| async move { remote.toggle_bookmark(id).await },
                    move |result| Completion::Bookmarked(id, result),
                );
            }
            Command::UpdateDeadline(id, deadline, reply) => {
                if let Some(selected) = self.state.selected.as_mut() {
                    selected.deadline = deadline;
                }
                self.dispatch(
                    reply,
                    move |remote| async move { remote.update_deadline(id, deadline).await },
                    move |result| Completion::DeadlineUpdated(id, deadline, result),
                );
            }
            Command::ToggleRepeat(id, reply) => {
                self.dispatch(
                    reply,
                    move |remote| async move { remote.toggle_repeat(id).await },
                    move |result| Completion::RepeatToggled(id, result),
                );
            }
            Command::Select(id, tx) => {
                let found = self.state.items.iter().find(|item| item.id == id).cloned();
                let selected = found.is_some();
                if selected {
                    self.state.selected = found;
                }
                self.answer(tx, selected);
            }
            Command::ClearSelection(reply) => {
                self.state.selected = None;
                self.reply(reply);
            }
            Command::PickUp(index, tx) => {
                let picked = self.reorder.pick_up(&self.state.items, index, |item| item.id);
                self.answer(tx, picked);
            }
            Command::Hover(index, tx) => {
                let moved = self.reorder.hover(&mut self.state.items, index, |item| item.id);
                self.answer(tx, moved);
            }
            Command::Drop(tx) => match self.reorder.drop_item() {
                DropOutcome::Reordered => self.persist_order(Reply::Dropped(tx)),
                DropOutcome::Unchanged => self.answer(tx, DropOutcome::Unchanged),
            },
            Command::CancelDrag(reply) => {
                self.reorder.cancel();
                self.reply(reply);
            }
        }
    }

    fn persist_order(&self, reply: Reply) {
        let ids = self.state.incomplete_ids();
        self.dispatch(
            reply,
            move |remote| async move { remote.drag_and_drop(TODAY_ORDER_TYPE, &ids).await },
            Completion::OrderPersisted,
        );
    }

    fn reconcile(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded(Ok(response)) => {
                info!(count = response.todays.len(), "today list loaded");
                self.state.replace(response.todays);
            }
            Completion::Loaded(Err(err)) => {
                error!(error = %err, "failed to load today list");
            }
            Completion::Completion { id, previous, result } => match result {
                Ok(()) => self.state.snapshot = self.state.items.clone(),
                Err(err) => {
                    error!(todo_id = id, error = %err, "failed to toggle completion, rolling back");
                    self.state.items = previous;
                }
            },
            Completion::Deferred(id, result) => match result {
                Ok(()) => self.state.snapshot = self.state.items.clone(),
                Err(err) => {
                    error!(todo_id = id, error = %err, "failed to defer todo, rolling back");
                    self.state.items = self.state.snapshot.clone();
                }
            },
            Completion::OrderPersisted(result) => {
                if let Err(err) = result {
                    error!(error = %err, "failed to persist today order");
                }
            }
            Completion::Removed(id, result) => {
                if let Err(err) = result {
                    error!(todo_id = id, error = %err, "failed to delete todo");
                }
            }
            Completion::Bookmarked(id, result) => match result {
                Ok(()) => {
                    if let Some(item) = self.state.item_mut(id) {
                        item.is_bookmark = !item.is_bookmark;
                    }
                }
                Err(err) => error!(todo_id = id, error = %err, "failed to toggle bookmark"),
            },
            Completion::DeadlineUpdated(id, deadline, result) => match result {
                Ok(()) => {
                    let today = self.clock.today();
                    let Some(item) = self.state.item_mut(id) else {
                        return;
                    };
                    item.set_deadline(deadline, today);
                    let dday = item.dday;
                    if let Some(selected) = self.state.selected.as_mut() {
                        selected.dday = dday;
                    }
                }
                Err(err) => error!(todo_id = id, error = %err, "failed to update deadline"),
            },
            Completion::RepeatToggled(id, result) => match result {
                Ok(()) => {
                    if let Some(item) = self.state.item_mut(id) {
                        item.is_repeat = !item.is_repeat;
                    }
                }
                Err(err) => error!(todo_id = id, error = %err, "failed to toggle repeat"),
            },
        }
    }
}

impl TodayListStore<TodoService<ReqwestTransport>> {
    /// Start a store talking to `config.base_url` over reqwest, loading
    /// pages of `config.page_size`.
    pub fn from_config(config: &ClientConfig, clock: Arc<dyn Clock>) -> TodayListHandle {
        Self::spawn(Arc::new(TodoService::from_config(config)), clock, config.page_size)
    }
}

/// Cloneable front door to a running `TodayListStore`.
///
/// Mutating calls resolve once the store has reconciled the remote result,
/// so callers can observe the final state right after awaiting.
#[derive(Clone)]
pub struct TodayListHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<TodayView>,
    clock: Arc<dyn Clock>,
}

impl TodayListHandle {
    pub async fn load(&self) -> Result<(), StoreClosed> {
        self.done(Command::Load).await
    }

    pub async fn toggle_completion(&self, id: TodoId) -> Result<(), StoreClosed> {
        self.done(|reply| Command::ToggleCompletion(id, reply)).await
    }

    /// Swipe `id` to tomorrow. The row stays until `dismiss` is called.
    pub async fn defer_to_tomorrow(&self, id: TodoId) -> Result<(), StoreClosed> {
        self.done(|reply| Command::Defer(id, reply)).await
    }

    /// Drop `id` from the local list without telling the server.
    pub async fn dismiss(&self, id: TodoId) -> Result<(), StoreClosed> {
        self.done(|reply| Command::Dismiss(id, reply)).await
    }

    pub async fn persist_order(&self) -> Result<(), StoreClosed> {
        self.done(Command::PersistOrder).await
    }

    pub async fn remove_item(&self, id: TodoId) -> Result<(), StoreClosed> {
        self.done(|reply| Command::Remove(id, reply)).await
    }

    pub async fn toggle_bookmark(&self, id: TodoId) -> Result<(), StoreClosed> {
        self.done(|reply| Command::ToggleBookmark(id, reply)).await
    }

    pub async fn update_deadline(&self, id: TodoId, deadline: Option<NaiveDate>) -> Result<(), StoreClosed> {
        self.done(|reply| Command::UpdateDeadline(id, deadline, reply)).await
    }

    pub async fn toggle_repeat(&self, id: TodoId) -> Result<(), StoreClosed> {
        self.done(|reply| Command::ToggleRepeat(id, reply)).await
    }

    /// Open `id` in the detail sheet. Returns false if it is not listed.
    pub async fn select(&self, id: TodoId) -> Result<bool, StoreClosed> {
        self.ask(|tx| Command::Select(id, tx)).await
    }

    pub async fn clear_selection(&self) -> Result<(), StoreClosed> {
        self.done(Command::ClearSelection).await
    }

    pub async fn pick_up(&self, index: usize) -> Result<bool, StoreClosed> {
        self.ask(|tx| Command::PickUp(index, tx)).await
    }

    pub async fn hover(&self, index: usize) -> Result<bool, StoreClosed> {
        self.ask(|tx| Command::Hover(index, tx)).await
    }

    /// Release the dragged item. A changed order is persisted before this
    /// resolves.
    pub async fn drop_item(&self) -> Result<DropOutcome, StoreClosed> {
        self.ask(Command::Drop).await
    }

    pub async fn cancel_drag(&self) -> Result<(), StoreClosed> {
        self.done(Command::CancelDrag).await
    }

    pub fn items(&self) -> Vec<TodayItem> {
        self.view.borrow().items.clone()
    }

    pub fn selected(&self) -> Option<TodayItem> {
        self.view.borrow().selected.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TodayView> {
        self.view.clone()
    }

    /// Today's date as shown in the list header, e.g. `01.10`.
    pub fn header_date(&self) -> String {
        self.clock.today().format("%m.%d").to_string()
    }

    async fn done(&self, make: impl FnOnce(Reply) -> Command) -> Result<(), StoreClosed> {
        self.ask(|tx| make(Reply::Done(tx))).await
    }

    async fn ask<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, StoreClosed> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(make(tx)).await.map_err(|_| StoreClosed)?;
        rx.await.map_err(|_| StoreClosed)
    }
}
