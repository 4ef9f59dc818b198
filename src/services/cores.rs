use super::dlc::{DlcService, SaveOutcome};
use crate::catalog::{self, RemoteCatalog};
use crate::changeset::{self, SaveError};
use crate::models::{Category, CoreOption, SpecialRecommendCore};
use crate::registry::RegistryError;
use crate::selection::SelectionState;
use indexmap::IndexSet;

/// Core options with their tab layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCores {
    pub options: Vec<CoreOption>,
    pub selections: SelectionState,
    pub tabs: Vec<String>,
    pub active_tab: String,
    pub book_name: Option<String>,
    /// Configured special recommendations, at most three, with availability
    pub special_recommend: Vec<SpecialRecommendCore>,
}

impl DlcService {
    /// Load cores and cross-reference them with the remote catalog.
    ///
    /// Catalog failures degrade to empty data inside [`RemoteCatalog`]; only
    /// registry errors surface here.
    pub async fn load_core_options(
        &self,
        remote: &RemoteCatalog,
    ) -> Result<LoadedCores, RegistryError> {
        let classification = remote.classification().await;
        let tabs = catalog::tabs_from_classification(&classification);

        let book_name = self.book_name();
        let entries = self
            .load_entries(Category::Core, book_name.as_deref())
            .await?;

        let installed: IndexSet<String> = entries.iter().map(|e| e.name.clone()).collect();
        let special_recommend =
            catalog::generate_special_recommend_cores(&*remote.special_recommend().await, &installed);

        let options =
            catalog::build_core_options(&entries, &tabs, &classification, &special_recommend);
        tracing::info!(
            "Loaded {} cores across {} tabs ({} special)",
            options.len(),
            tabs.len(),
            special_recommend.iter().filter(|s| s.available).count()
        );

        Ok(LoadedCores {
            selections: SelectionState::from_options(&options),
            active_tab: catalog::default_active_tab(&tabs),
            options,
            tabs,
            book_name,
            special_recommend,
        })
    }

    pub async fn save_core_changes(
        &self,
        book_name: Option<&str>,
        options: &[CoreOption],
        selections: &SelectionState,
    ) -> Result<SaveOutcome<CoreOption>, SaveError> {
        let plan = changeset::plan_core_save(options, selections);
        self.commit(Category::Core, book_name, options, selections, plan)
            .await
    }
}
