use super::{Registry, RegistryError, WorldBooks};
use crate::models::{EntryUpdate, RawEntry};
use async_trait::async_trait;
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Process-local registry.
///
/// Counts queries and batch writes, and can be told to fail writes so callers
/// can exercise their failure paths.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    books: RwLock<WorldBooks>,
    queries: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a book and make it active.
    pub fn with_book(self, name: impl Into<String>, entries: Vec<RawEntry>) -> Self {
        let name = name.into();
        {
            let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
            books.books.insert(name.clone(), entries);
            books.active = Some(name);
        }
        self
    }

    pub fn from_books(books: WorldBooks) -> Self {
        Self {
            books: RwLock::new(books),
            ..Self::default()
        }
    }

    pub fn set_active(&self, name: Option<&str>) {
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = name.map(str::to_string);
    }

    /// Current entries of a book, empty if it does not exist.
    pub fn entries(&self, book: &str) -> Vec<RawEntry> {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .books
            .get(book)
            .cloned()
            .unwrap_or_default()
    }

    /// Enabled flag of one entry, `None` if absent.
    pub fn is_enabled(&self, book: &str, name: &str) -> Option<bool> {
        self.entries(book)
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.enabled)
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn get_filtered_entries(
        &self,
        pattern: &Regex,
        scope: &str,
    ) -> Result<Vec<RawEntry>, RegistryError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .filter(pattern, scope)
    }

    async fn update_world_book(
        &self,
        entries: &[EntryUpdate],
        scope: &str,
    ) -> Result<(), RegistryError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(RegistryError::Unavailable("writes disabled".to_string()));
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(entries, scope)?;
        Ok(())
    }

    fn world_book_name(&self) -> Option<String> {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .clone()
    }
}
