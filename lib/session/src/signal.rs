//! Change generation counter for cross-view invalidation.
//!
//! A view that mutates shared server data bumps the generation; views that
//! read that data include the generation in their refetch trigger. The
//! signal carries no payload and makes no ordering promise beyond monotonic
//! increase.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Process-wide generation counter. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct ChangeSignal {
    generation: Arc<watch::Sender<u64>>,
}

impl ChangeSignal {
    /// Creates a counter starting at generation 0.
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            generation: Arc::new(generation),
        }
    }

    /// Advances the generation and returns the new value.
    pub fn bump(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            current = *generation;
        });
        debug!(generation = current, "Change generation bumped");
        current
    }

    /// Returns the current generation.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Returns a receiver that wakes on every bump.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Returns an observer positioned at the current generation.
    #[must_use]
    pub fn observer(&self) -> GenerationObserver {
        GenerationObserver {
            seen: Some(self.current_generation()),
        }
    }
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A reader's cursor over the generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationObserver {
    seen: Option<u64>,
}

impl GenerationObserver {
    /// Creates an observer that has seen nothing, so its first poll reports a change.
    #[must_use]
    pub fn unseen() -> Self {
        Self::default()
    }

    /// Reports the new generation if it changed since the last poll.
    pub fn poll(&mut self, signal: &ChangeSignal) -> Option<u64> {
        let current = signal.current_generation();
        if self.seen == Some(current) {
            return None;
        }
        self.seen = Some(current);
        Some(current)
    }

    /// Returns the last generation this observer saw.
    #[must_use]
    pub fn seen(&self) -> Option<u64> {
        self.seen
    }
}

/// A cached read that is refetched whenever the generation moves.
#[derive(Debug, Clone)]
pub struct GenerationCache<T> {
    entry: Option<(u64, T)>,
}

impl<T> GenerationCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Returns the cached value regardless of staleness.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    /// Returns true if nothing is cached or the generation moved since the fetch.
    #[must_use]
    pub fn is_stale(&self, signal: &ChangeSignal) -> bool {
        match &self.entry {
            Some((generation, _)) => *generation != signal.current_generation(),
            None => true,
        }
    }

    /// Drops the cached value.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Returns the cached value, fetching it first if stale.
    ///
    /// The value is tagged with the generation observed before the fetch
    /// started, so a bump during the fetch makes the next call refetch.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous value stays cached.
    pub async fn refresh_with<F, Fut, E>(&mut self, signal: &ChangeSignal, fetch: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = signal.current_generation();
        let entry = match self.entry.take() {
            Some(entry) if entry.0 == generation => entry,
            previous => match fetch().await {
                Ok(value) => (generation, value),
                Err(e) => {
                    self.entry = previous;
                    return Err(e);
                }
            },
        };
        Ok(&self.entry.insert(entry).1)
    }
}

impl<T> Default for GenerationCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
