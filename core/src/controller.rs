//! View-state controller for the todo list.
//!
//! # Design
//! `TodoController` owns the state a view binds to (items, input text,
//! loaded flag) and drives a `TodoBackend`. Mutations do not patch the list:
//! after `add_todo` and `del_todo` the controller schedules a full re-list
//! after `refresh_delay`, giving the backend time to make the write visible
//! to queries. Every re-list replaces the items wholesale, so overlapping
//! refreshes settle on whichever completes last.
//!
//! `change_todo` does not re-list unless `refresh_after_toggle` is set.
//!
//! Failures are logged here and returned to the caller. Only `load_todos`
//! retries, and only on transient errors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::TodoBackend;
use crate::error::ApiError;
use crate::types::{InsertTodo, TodoItem, TodoList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Wait between a successful mutation and the re-list it triggers.
    pub refresh_delay: Duration,
    /// Extra attempts for a failed list call.
    pub list_retries: u32,
    pub refresh_after_toggle: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            refresh_delay: Duration::from_millis(500),
            list_retries: 2,
            refresh_after_toggle: false,
        }
    }
}

/// What the view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub todos: Vec<TodoItem>,
    pub new_title: String,
    pub loaded: bool,
}

pub struct TodoController<B> {
    backend: Arc<B>,
    config: ControllerConfig,
    state: Mutex<ViewState>,
    /// Scheduled re-lists. Dropping a handle detaches the task, it never
    /// cancels it.
    refreshes: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: TodoBackend + 'static> TodoController<B> {
    pub fn new(backend: Arc<B>, config: ControllerConfig) -> Arc<Self> {
        Arc::new(Self {
            backend,
            config,
            state: Mutex::new(ViewState::default()),
            refreshes: Mutex::new(Vec::new()),
        })
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn todos(&self) -> Vec<TodoItem> {
        self.state.lock().await.todos.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    pub async fn set_new_title(&self, title: impl Into<String>) {
        self.state.lock().await.new_title = title.into();
    }

    /// Wait for the backend to report loaded, then mark the view loaded and
    /// list once.
    pub fn attach(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut loaded = self.backend.loaded();
        tokio::spawn(async move {
            let ready = loaded.wait_for(|loaded| *loaded).await.is_ok();
            if !ready {
                tracing::warn!("backend dropped before it finished loading");
                return;
            }
            controller.state.lock().await.loaded = true;
            tracing::info!("backend loaded");
            // Already logged by load_todos.
            let _ = controller.load_todos().await;
        })
    }

    /// Replace the items with the server's list, in server order.
    #[tracing::instrument(skip(self))]
    pub async fn load_todos(&self) -> Result<(), ApiError> {
        let list = self
            .list_with_retry()
            .await
            .inspect_err(|err| tracing::warn!("listing todos failed: {err}"))?;
        tracing::debug!(count = list.items.len(), "todos listed");
        self.state.lock().await.todos = list.items;
        Ok(())
    }

    /// Insert the current input text. On success the input is cleared and a
    /// re-list is scheduled.
    #[tracing::instrument(skip(self))]
    pub async fn add_todo(self: &Arc<Self>) -> Result<TodoItem, ApiError> {
        let title = self.state.lock().await.new_title.clone();
        let item = self
            .backend
            .insert(&InsertTodo { title })
            .await
            .inspect_err(|err| tracing::warn!("adding todo failed: {err}"))?;
        self.state.lock().await.new_title.clear();
        tracing::info!(id = %item.id, "todo added");
        self.schedule_refresh().await;
        Ok(item)
    }

    #[tracing::instrument(skip(self, item), fields(id = %item.id))]
    pub async fn change_todo(self: &Arc<Self>, item: &TodoItem) -> Result<TodoItem, ApiError> {
        let toggled = self
            .backend
            .toggle(&item.id)
            .await
            .inspect_err(|err| tracing::warn!("toggling todo failed: {err}"))?;
        tracing::info!(completed = toggled.completed, "task was toggled");
        if self.config.refresh_after_toggle {
            self.schedule_refresh().await;
        }
        Ok(toggled)
    }

    #[tracing::instrument(skip(self, item), fields(id = %item.id))]
    pub async fn del_todo(self: &Arc<Self>, item: &TodoItem) -> Result<(), ApiError> {
        self.backend
            .delete(&item.id)
            .await
            .inspect_err(|err| tracing::warn!("deleting todo failed: {err}"))?;
        tracing::info!("todo deleted");
        self.schedule_refresh().await;
        Ok(())
    }

    /// Wait until every scheduled re-list has run, including ones scheduled
    /// while waiting.
    ///
    /// Cancelling the wait leaves pending re-lists running.
    pub async fn settle(&self) {
        loop {
            let next = self.refreshes.lock().await.pop();
            let Some(handle) = next else {
                break;
            };
            if let Err(err) = handle.await {
                tracing::warn!("refresh task failed: {err}");
            }
        }
    }

    async fn schedule_refresh(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        let delay = self.config.refresh_delay;
        let mut refreshes = self.refreshes.lock().await;
        refreshes.retain(|handle| !handle.is_finished());
        refreshes.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = controller.load_todos().await;
        }));
    }

    async fn list_with_retry(&self) -> Result<TodoList, ApiError> {
        let mut attempt = 0;
        loop {
            match self.backend.list().await {
                Err(err) if err.is_transient() && attempt < self.config.list_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, "retrying list after: {err}");
                }
                result => return result,
            }
        }
    }
}

impl<B> std::fmt::Debug for TodoController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
