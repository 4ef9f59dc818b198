//! End-to-end tests for SessionController
//!
//! A snapshot file on disk stands in for the world-book registry so a full
//! reload → toggle → save → reopen cycle can be observed.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use dlc_manager::catalog::{DataSource, FetchError, RemoteCatalog};
use dlc_manager::metrics::Metrics;
use dlc_manager::services::DlcService;
use dlc_manager::{
    Category, InMemoryRegistry, RawEntry, Registry, SessionController, SnapshotRegistry,
    StateChange, StateManager,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"
active: 命定之诗
books:
  命定之诗:
    - name: "命定系统-英雄(A)"
      enabled: true
    - name: "命定系统-刺客(B)"
      enabled: false
    - name: "[角色]薇薇拉(K1nn-原创角色)"
      enabled: false
    - name: "[事件][双子]双子星的咏叹调-本体"
      enabled: true
    - name: "[扩展][基础]基础设定"
      enabled: false
    - name: "[扩展][进阶][<基础]进阶设定(Hilo)"
      enabled: false
    - name: "[扩展][新版][>旧版]新地图"
      enabled: false
    - name: "[世界][旧版]旧地图"
      enabled: true
"#;

struct ClassificationOnly;

#[async_trait]
impl DataSource for ClassificationOnly {
    async fn fetch(&self, file: &str) -> Result<Option<String>, FetchError> {
        Ok((file == "coreClassification.json")
            .then(|| r#"{ "主榜": { "英雄": { note: "第一" } } }"#.to_string()))
    }
}

fn controller(registry: Arc<dyn Registry>) -> (SessionController, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    let state = Arc::new(StateManager::new().with_metrics(metrics.clone()));
    let service = DlcService::new(registry, metrics.clone());
    let catalog = RemoteCatalog::new(Arc::new(ClassificationOnly));
    (SessionController::new(state, service, catalog), metrics)
}

async fn snapshot_registry(temp_dir: &TempDir) -> (Utf8PathBuf, SnapshotRegistry) {
    let path = Utf8PathBuf::try_from(temp_dir.path().join("worldbook.yaml")).unwrap();
    std::fs::write(&path, SNAPSHOT).unwrap();
    let registry = SnapshotRegistry::open(&path).await.unwrap();
    (path, registry)
}

#[tokio::test]
async fn test_reload_builds_every_category() {
    let temp_dir = TempDir::new().unwrap();
    let (_path, registry) = snapshot_registry(&temp_dir).await;
    let (controller, _metrics) = controller(Arc::new(registry));

    controller.reload().await.unwrap();
    let state = controller.state().snapshot();

    assert_eq!(state.option_count(Category::Core), 2);
    assert_eq!(state.option_count(Category::Character), 1);
    assert_eq!(state.option_count(Category::Event), 1);
    assert_eq!(state.option_count(Category::Extension), 3);
    assert_eq!(state.tabs, vec!["特别推荐", "主榜", "这是什么杯"]);
    assert_eq!(state.selected_core(), Some("命定系统-英雄(A)"));

    let hero = state.cores.find("命定系统-英雄(A)").unwrap();
    assert_eq!(hero.note, "第一");
    let character = &state.characters.options[0];
    assert_eq!(character.label, "薇薇拉");
    assert_eq!(character.author, "K1nn");
    assert_eq!(character.info, "原创角色");
}

#[tokio::test]
async fn test_toggle_save_and_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let (path, registry) = snapshot_registry(&temp_dir).await;
    let (controller, metrics) = controller(Arc::new(registry));
    controller.reload().await.unwrap();

    controller.toggle(Category::Extension, "[扩展][新版]");
    controller.toggle(Category::Character, "[角色]薇薇拉(K1nn-原创角色)");
    controller.select_core("命定系统-刺客(B)");

    controller.save(Category::Extension).await.unwrap();
    controller.save(Category::Character).await.unwrap();
    controller.save(Category::Core).await.unwrap();
    assert!(!controller.state().read(|s| s.has_any_changes()));
    assert_eq!(metrics.saves_committed.load(Ordering::Relaxed), 3);

    // A fresh registry sees what was persisted
    let reopened = SnapshotRegistry::open(&path).await.unwrap();
    let book = reopened.books().books.shift_remove("命定之诗").unwrap();
    let enabled = |name: &str| book.iter().find(|e| e.name == name).map(|e| e.enabled);

    assert_eq!(enabled("[扩展][新版][>旧版]新地图"), Some(true));
    assert_eq!(enabled("[世界][旧版]旧地图"), Some(false));
    assert_eq!(enabled("[角色]薇薇拉(K1nn-原创角色)"), Some(true));
    assert_eq!(enabled("命定系统-刺客(B)"), Some(true));
    assert_eq!(enabled("命定系统-英雄(A)"), Some(false));
}

#[tokio::test]
async fn test_rejected_toggle_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let (_path, registry) = snapshot_registry(&temp_dir).await;
    let (controller, metrics) = controller(Arc::new(registry));
    controller.reload().await.unwrap();
    let before = controller.state().snapshot();

    let changes = controller.toggle(Category::Extension, "[扩展][进阶]");

    assert_eq!(
        changes,
        vec![StateChange::ToggleRejected {
            key: "[扩展][进阶]".to_string(),
            missing: vec!["基础".to_string()],
        }]
    );
    assert_eq!(controller.state().snapshot(), before);
    assert_eq!(metrics.toggles_rejected.load(Ordering::Relaxed), 1);

    // With the prerequisite on, the same toggle goes through
    controller.toggle(Category::Extension, "[扩展][基础]");
    controller.toggle(Category::Extension, "[扩展][进阶]");
    assert!(
        controller
            .state()
            .read(|s| s.extensions.selections.get("[扩展][进阶]"))
    );
}

#[tokio::test]
async fn test_failed_save_leaves_state_untouched() {
    let registry = Arc::new(
        InMemoryRegistry::new().with_book("书", vec![RawEntry::new("[角色]甲", false)]),
    );
    let (controller, _metrics) = controller(registry.clone());
    controller.reload().await.unwrap();
    controller.toggle(Category::Character, "[角色]甲");
    let before = controller.state().snapshot();

    registry.fail_writes(true);
    let err = controller.save(Category::Character).await.unwrap_err();

    assert!(err.to_string().contains("Failed to save"));
    assert_eq!(controller.state().snapshot(), before);
    assert!(controller.state().read(|s| s.has_changes(Category::Character)));

    // Retry once the registry recovers
    registry.fail_writes(false);
    controller.save(Category::Character).await.unwrap();
    assert_eq!(registry.is_enabled("书", "[角色]甲"), Some(true));
}

#[tokio::test]
async fn test_save_writes_to_the_loaded_book() {
    let registry = Arc::new(
        InMemoryRegistry::new()
            .with_book("旁书", vec![RawEntry::new("[角色]甲", false)])
            .with_book("书", vec![RawEntry::new("[角色]甲", false)]),
    );
    let (controller, _metrics) = controller(registry.clone());
    controller.reload().await.unwrap();

    registry.set_active(Some("旁书"));
    controller.toggle(Category::Character, "[角色]甲");
    controller.save(Category::Character).await.unwrap();

    assert_eq!(registry.is_enabled("书", "[角色]甲"), Some(true));
    assert_eq!(registry.is_enabled("旁书", "[角色]甲"), Some(false));
}

#[tokio::test]
async fn test_save_without_changes_emits_nothing() {
    let registry = Arc::new(
        InMemoryRegistry::new().with_book("书", vec![RawEntry::new("[角色]甲", true)]),
    );
    let (controller, metrics) = controller(registry.clone());
    controller.reload().await.unwrap();

    let changes = controller.save(Category::Character).await.unwrap();
    assert!(changes.is_empty());
    assert_eq!(registry.write_count(), 0);
    assert_eq!(metrics.saves_skipped.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_discard_restores_persisted_flags() {
    let registry = Arc::new(
        InMemoryRegistry::new().with_book("书", vec![RawEntry::new("[角色]甲", true)]),
    );
    let (controller, _metrics) = controller(registry);
    controller.reload().await.unwrap();

    controller.toggle(Category::Character, "[角色]甲");
    assert!(controller.state().read(|s| s.has_changes(Category::Character)));

    controller.discard(Category::Character);
    assert!(!controller.state().read(|s| s.has_any_changes()));
}

#[tokio::test]
async fn test_no_world_book_loads_empty_session() {
    let registry = Arc::new(InMemoryRegistry::new());
    let (controller, _metrics) = controller(registry.clone());

    controller.reload().await.unwrap();
    let state = controller.state().snapshot();

    assert_eq!(state.book_name, None);
    assert_eq!(state.option_count(Category::Core), 0);
    assert_eq!(registry.query_count(), 0);
}
