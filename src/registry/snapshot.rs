use super::{Registry, RegistryError};
use crate::models::{EntryUpdate, RawEntry};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Named world books plus the active one.
///
/// This is also the on-disk snapshot format:
///
/// ```yaml
/// active: 主世界书
/// books:
///   主世界书:
///     - name: "[角色]薇薇拉(K1nn-原创角色)"
///       enabled: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBooks {
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub books: IndexMap<String, Vec<RawEntry>>,
}

impl WorldBooks {
    pub fn filter(&self, pattern: &Regex, scope: &str) -> Result<Vec<RawEntry>, RegistryError> {
        let book = self
            .books
            .get(scope)
            .ok_or_else(|| RegistryError::UnknownBook(scope.to_string()))?;
        Ok(book
            .iter()
            .filter(|entry| pattern.is_match(&entry.name))
            .cloned()
            .collect())
    }

    /// Apply a batch to one book. Returns how many entries were touched.
    ///
    /// Names absent from the book are ignored.
    pub fn apply(&mut self, updates: &[EntryUpdate], scope: &str) -> Result<usize, RegistryError> {
        let book = self
            .books
            .get_mut(scope)
            .ok_or_else(|| RegistryError::UnknownBook(scope.to_string()))?;

        let wanted: IndexMap<&str, bool> = updates
            .iter()
            .map(|update| (update.name.as_str(), update.enabled))
            .collect();

        let mut touched = 0;
        for entry in book.iter_mut() {
            if let Some(&enabled) = wanted.get(entry.name.as_str()) {
                entry.enabled = enabled;
                touched += 1;
            }
        }

        if touched < wanted.len() {
            tracing::debug!(
                "{} of {} updates named no entry in {}",
                wanted.len() - touched,
                wanted.len(),
                scope
            );
        }
        Ok(touched)
    }
}

/// World books persisted as a YAML snapshot, rewritten after every batch.
#[derive(Debug)]
pub struct SnapshotRegistry {
    path: Utf8PathBuf,
    books: RwLock<WorldBooks>,
}

impl SnapshotRegistry {
    /// Open a snapshot file. A missing file starts with no books.
    pub async fn open<P: AsRef<Utf8Path>>(path: P) -> Result<Self, RegistryError> {
        let path = path.as_ref().to_path_buf();

        let books = if tokio::fs::try_exists(&path).await? {
            let contents = tokio::fs::read_to_string(&path).await?;
            let books: WorldBooks = serde_yaml_ng::from_str(&contents)?;
            tracing::info!(
                "Loaded {} world book(s) from {}",
                books.books.len(),
                path
            );
            books
        } else {
            tracing::warn!("Snapshot {} not found, starting empty", path);
            WorldBooks::default()
        };

        Ok(Self {
            path,
            books: RwLock::new(books),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Copy of the current books.
    pub fn books(&self) -> WorldBooks {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn persist(&self, books: &WorldBooks) -> Result<(), RegistryError> {
        let yaml = serde_yaml_ng::to_string(books)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, yaml).await?;
        Ok(())
    }
}

#[async_trait]
impl Registry for SnapshotRegistry {
    async fn get_filtered_entries(
        &self,
        pattern: &Regex,
        scope: &str,
    ) -> Result<Vec<RawEntry>, RegistryError> {
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
        let mut next = self.books();
        let touched = next.apply(entries, scope)?;

        // Disk first: the in-memory copy only moves once the batch is durable.
        self.persist(&next).await?;
        *self.books.write().unwrap_or_else(PoisonError::into_inner) = next;

        tracing::info!("Wrote {} entries to {} ({})", touched, scope, self.path);
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> WorldBooks {
        let mut books = IndexMap::new();
        books.insert(
            "主".to_string(),
            vec![
                RawEntry::new("[角色]甲", true),
                RawEntry::new("[事件][X]乙", false),
            ],
        );
        WorldBooks {
            active: Some("主".to_string()),
            books,
        }
    }

    #[test]
    fn test_filter_and_unknown_book() {
        let books = sample();
        let pattern = Regex::new(r"^\[角色\]").unwrap();

        let found = books.filter(&pattern, "主").unwrap();
        assert_eq!(found, vec![RawEntry::new("[角色]甲", true)]);

        assert!(matches!(
            books.filter(&pattern, "别的"),
            Err(RegistryError::UnknownBook(_))
        ));
    }

    #[test]
    fn test_apply_ignores_unknown_names() {
        let mut books = sample();
        let touched = books
            .apply(
                &[
                    EntryUpdate::new("[事件][X]乙", true),
                    EntryUpdate::new("不存在", true),
                ],
                "主",
            )
            .unwrap();

        assert_eq!(touched, 1);
        assert!(books.books["主"][1].enabled);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("books.yaml")).unwrap();
        std::fs::write(&path, serde_yaml_ng::to_string(&sample()).unwrap()).unwrap();

        let registry = SnapshotRegistry::open(&path).await.unwrap();
        assert_eq!(registry.world_book_name().as_deref(), Some("主"));

        registry
            .update_world_book(&[EntryUpdate::new("[角色]甲", false)], "主")
            .await
            .unwrap();

        let reopened = SnapshotRegistry::open(&path).await.unwrap();
        assert!(!reopened.books().books["主"][0].enabled);
    }

    #[tokio::test]
    async fn test_missing_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("none.yaml")).unwrap();

        let registry = SnapshotRegistry::open(&path).await.unwrap();
        assert_eq!(registry.world_book_name(), None);
        assert!(registry.books().books.is_empty());
    }
}
