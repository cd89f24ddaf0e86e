//! Per-entity orchestration of independently loaded sections.
//!
//! A loader holds one view value (a struct of [`SectionState`] slots) for the
//! entity it is currently bound to. Every [`SectionedLoader::bind`] discards
//! the previous view and advances the [`Generation`]; results are applied
//! through [`SectionedLoader::update`], which ignores anything tagged with an
//! older generation. Requests are never cancelled, their late results are
//! simply dropped at the apply boundary.

use std::{fmt, future::Future};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::GatewayResult;

#[derive(Debug, Clone, PartialEq)]
pub enum SectionState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for SectionState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl<T> SectionState<T> {
    pub fn status(&self) -> SectionStatus {
        match self {
            Self::Idle => SectionStatus::Idle,
            Self::Loading => SectionStatus::Loading,
            Self::Ready(_) => SectionStatus::Ready,
            Self::Failed(_) => SectionStatus::Failed,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SectionState<U> {
        match self {
            Self::Idle => SectionState::Idle,
            Self::Loading => SectionState::Loading,
            Self::Ready(data) => SectionState::Ready(f(data)),
            Self::Failed(message) => SectionState::Failed(message),
        }
    }
}

/// Epoch of a loader binding. Only results carrying the current generation
/// may touch the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct LoaderState<V> {
    generation: Generation,
    entity: Option<String>,
    view: V,
}

pub struct SectionedLoader<V> {
    inner: Mutex<LoaderState<V>>,
}

impl<V: Default> Default for SectionedLoader<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Default> SectionedLoader<V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LoaderState {
                generation: Generation::default(),
                entity: None,
                view: V::default(),
            }),
        }
    }

    /// Rebinds the loader to `entity`, resetting every section to idle.
    pub async fn bind(&self, entity: impl Into<String>) -> Generation {
        let entity = entity.into();
        let mut guard = self.inner.lock().await;
        guard.generation = guard.generation.next();
        guard.view = V::default();
        debug!(entity = %entity, generation = %guard.generation, "loader bound");
        guard.entity = Some(entity);
        guard.generation
    }

    /// Applies `f` when `generation` is still current. Returns whether the
    /// update was applied.
    pub async fn update<F>(&self, generation: Generation, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            return false;
        }
        f(&mut guard.view);
        true
    }

    /// Runs one section: marks it loading, awaits `fetch`, and stores the
    /// outcome if the binding has not moved on in the meantime.
    pub async fn load_section<T, S, Fut>(
        &self,
        generation: Generation,
        section: &'static str,
        fallback: &str,
        slot: S,
        fetch: Fut,
    ) -> bool
    where
        S: Fn(&mut V) -> &mut SectionState<T>,
        Fut: Future<Output = GatewayResult<T>>,
    {
        if !self
            .update(generation, |view| *slot(view) = SectionState::Loading)
            .await
        {
            debug!(section, generation = %generation, "section skipped for stale binding");
            return false;
        }

        let state = match fetch.await {
            Ok(data) => SectionState::Ready(data),
            Err(err) => {
                warn!(section, generation = %generation, error = %err, "section load failed");
                SectionState::Failed(err.user_message(fallback))
            }
        };

        let applied = self
            .update(generation, |view| *slot(view) = state)
            .await;
        if !applied {
            debug!(section, generation = %generation, "dropped stale section result");
        }
        applied
    }

    pub async fn generation(&self) -> Generation {
        self.inner.lock().await.generation
    }

    pub async fn is_current(&self, generation: Generation) -> bool {
        self.inner.lock().await.generation == generation
    }

    pub async fn entity(&self) -> Option<String> {
        self.inner.lock().await.entity.clone()
    }
}

impl<V: Default + Clone> SectionedLoader<V> {
    pub async fn snapshot(&self) -> V {
        self.inner.lock().await.view.clone()
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
