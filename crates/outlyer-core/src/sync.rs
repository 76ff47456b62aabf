//! Apply and export orchestration.
//!
//! Both operations fan out one tokio task per resource (apply) or per
//! selector (export), join every handle, then build a single [`Report`].
//! A task never aborts its siblings: classification, codec, disk and
//! remote failures all end up as `Outcome::Failed` on the task's own
//! record. Only an unwritable export root stops a run, and that is
//! checked before anything is spawned.

use std::sync::Arc;

use futures::future::join_all;
use outlyer_api::RemoteResourceService;
use serde_yaml::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{Result, SyncError};
use crate::report::{Outcome, Report, ResourceRecord};
use crate::resolver::ExportSelector;
use crate::resource::{ResourceKind, ResourceRef};
use crate::store::{join, FileStore};

/// Drives apply and export against a remote service and a file store.
#[derive(Clone)]
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteResourceService>,
    store: Arc<dyn FileStore>,
}

impl SyncOrchestrator {
    pub fn new(remote: Arc<dyn RemoteResourceService>, store: Arc<dyn FileStore>) -> Self {
        Self { remote, store }
    }

    /// Push local files to `account`, updating each resource or creating
    /// it when the update answers 404.
    pub async fn apply(&self, account: &str, paths: &[String]) -> Report {
        info!("Applying {} resources to account {}", paths.len(), account);

        let mut tasks: Vec<JoinHandle<ResourceRecord>> = Vec::with_capacity(paths.len());
        for path in paths {
            let remote = Arc::clone(&self.remote);
            let store = Arc::clone(&self.store);
            let account = account.to_string();
            let source_path = path.clone();

            let task = tokio::spawn(async move {
                apply_one(remote.as_ref(), store.as_ref(), &account, &source_path).await
            });
            tasks.push(task);
        }

        // Barrier: every record is settled before the report is built
        let records: Vec<ResourceRecord> = paths
            .iter()
            .zip(join_all(tasks).await)
            .map(|(path, joined)| match joined {
                Ok(record) => record,
                Err(e) => ResourceRecord::failed(path, SyncError::Task(e.to_string())),
            })
            .collect();

        let report = Report::new(account, records);
        info!(
            "Applied {} resources, {} failed",
            report.len(),
            report.failures()
        );
        report
    }

    /// Pull the selected resources from `account` into `folder`.
    ///
    /// Fails only when the output root cannot be created.
    pub async fn export(
        &self,
        account: &str,
        selectors: &[ExportSelector],
        folder: &str,
    ) -> Result<Report> {
        if !folder.is_empty() {
            self.store.make_dirs(folder)?;
        }
        info!(
            "Exporting {} selectors from account {} into {:?}",
            selectors.len(),
            account,
            folder
        );

        let mut tasks: Vec<JoinHandle<Vec<ResourceRecord>>> = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let remote = Arc::clone(&self.remote);
            let store = Arc::clone(&self.store);
            let account = account.to_string();
            let folder = folder.to_string();
            let selector = selector.clone();

            let task = tokio::spawn(async move {
                export_selector(remote.as_ref(), store.as_ref(), &account, &selector, &folder).await
            });
            tasks.push(task);
        }

        let mut records = Vec::new();
        for (selector, joined) in selectors.iter().zip(join_all(tasks).await) {
            match joined {
                Ok(batch) => records.extend(batch),
                Err(e) => records.push(ResourceRecord::failed(
                    &selector.to_string(),
                    SyncError::Task(e.to_string()),
                )),
            }
        }

        let report = Report::new(account, records);
        info!(
            "Exported {} resources, {} failed",
            report.len(),
            report.failures()
        );
        Ok(report)
    }
}

async fn apply_one(
    remote: &dyn RemoteResourceService,
    store: &dyn FileStore,
    account: &str,
    path: &str,
) -> ResourceRecord {
    let mut record = ResourceRecord::pending(path);
    match upsert(remote, store, account, &mut record).await {
        Ok(outcome) => record.settle(outcome),
        Err(e) => {
            warn!(path = %path, error = %e, "apply failed");
            record.settle(Outcome::Failed(e.to_string()))
        }
    }
}

async fn upsert(
    remote: &dyn RemoteResourceService,
    store: &dyn FileStore,
    account: &str,
    record: &mut ResourceRecord,
) -> Result<Outcome> {
    let reference = ResourceRef::from_path(&record.source_path)?;
    record.reference = Some(reference.clone());
    record.raw_bytes = store.read_file(&record.source_path)?;
    record.wire_bytes = codec::encode(reference.kind, &record.raw_bytes, &reference.file_name())?;

    let resource_path = reference.resource_path(account);
    debug!(path = %resource_path, "updating");
    let response = remote.update(&resource_path, &record.wire_bytes).await?;

    if response.is_not_found() {
        let collection_path = reference.collection_path(account);
        info!("{} not found, creating it in {}", reference, collection_path);
        remote
            .create(&collection_path, &record.wire_bytes)
            .await?
            .into_result()?;
        return Ok(Outcome::Created);
    }

    response.into_result()?;
    Ok(Outcome::Updated)
}

async fn export_selector(
    remote: &dyn RemoteResourceService,
    store: &dyn FileStore,
    account: &str,
    selector: &ExportSelector,
    folder: &str,
) -> Vec<ResourceRecord> {
    let label = selector.to_string();
    let documents = match fetch_documents(remote, account, selector).await {
        Ok(documents) => documents,
        Err(e) => {
            warn!(selector = %label, error = %e, "export fetch failed");
            return vec![ResourceRecord::failed(&label, e)];
        }
    };
    debug!(selector = %label, count = documents.len(), "fetched documents");

    let dir = selector.output_dir(folder);
    documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| match document {
            Ok((name, wire)) => write_document(store, selector.kind, &dir, &name, wire),
            Err(e) => {
                let position = format!("{label}[{index}]");
                warn!(document = %position, error = %e, "skipping unreadable document");
                ResourceRecord::failed(&position, e)
            }
        })
        .collect()
}

/// `(remote name, wire bytes)` for every document behind a selector.
///
/// The outer error fails the whole selector; an inner error fails only
/// that document.
async fn fetch_documents(
    remote: &dyn RemoteResourceService,
    account: &str,
    selector: &ExportSelector,
) -> Result<Vec<Result<(String, Vec<u8>)>>> {
    let body = remote.get(&selector.remote_path(account)).await?;

    match &selector.name {
        Some(requested) => {
            let doc: Value = serde_yaml::from_slice(&body).map_err(codec_error)?;
            let name = codec::document_name(&doc).unwrap_or_else(|_| requested.clone());
            Ok(vec![Ok((name, body))])
        }
        None if body.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        None => {
            let docs: Vec<Value> = serde_yaml::from_slice(&body).map_err(codec_error)?;
            Ok(docs.into_iter().map(split_document).collect())
        }
    }
}

fn split_document(doc: Value) -> Result<(String, Vec<u8>)> {
    let name = codec::document_name(&doc)?;
    let wire = serde_yaml::to_string(&doc).map_err(codec_error)?;
    Ok((name, wire.into_bytes()))
}

fn codec_error(e: serde_yaml::Error) -> SyncError {
    SyncError::Codec(e.into())
}

fn write_document(
    store: &dyn FileStore,
    kind: ResourceKind,
    dir: &str,
    name: &str,
    wire: Vec<u8>,
) -> ResourceRecord {
    let mut record = ResourceRecord::pending(&join(dir, name));
    record.wire_bytes = wire;
    match persist(store, kind, dir, name, &mut record) {
        Ok(()) => {
            debug!(path = %record.source_path, "wrote resource");
            record.settle(Outcome::Written)
        }
        Err(e) => {
            warn!(path = %record.source_path, error = %e, "export write failed");
            record.settle(Outcome::Failed(e.to_string()))
        }
    }
}

fn persist(
    store: &dyn FileStore,
    kind: ResourceKind,
    dir: &str,
    name: &str,
    record: &mut ResourceRecord,
) -> Result<()> {
    let reference = ResourceRef::for_document(kind, name)?;
    record.source_path = join(dir, &reference.file_name());
    record.reference = Some(reference);
    record.raw_bytes = codec::decode(kind, &record.wire_bytes)?;

    store.make_dirs(dir)?;
    store.write_file(&record.source_path, &record.raw_bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryFileStore;
    use outlyer_api::fakes::{MemoryRemoteService, RemoteMethod};

    fn orchestrator(
        remote: MemoryRemoteService,
        store: MemoryFileStore,
    ) -> (SyncOrchestrator, Arc<MemoryRemoteService>, Arc<MemoryFileStore>) {
        let remote = Arc::new(remote);
        let store = Arc::new(store);
        (
            SyncOrchestrator::new(remote.clone(), store.clone()),
            remote,
            store,
        )
    }

    #[tokio::test]
    async fn test_update_without_create() {
        let (sync, remote, _) = orchestrator(
            MemoryRemoteService::new().with_document("/accounts/acme/alerts/docker", "name: docker"),
            MemoryFileStore::new().with_file("alerts/docker.yaml", "name: docker\nlevel: 2\n"),
        );

        let report = sync.apply("acme", &["alerts/docker.yaml".to_string()]).await;

        assert_eq!(report.records[0].outcome, Outcome::Updated);
        assert!(remote.paths_for(RemoteMethod::Create).is_empty());
        assert_eq!(
            remote.document("/accounts/acme/alerts/docker").unwrap(),
            b"name: docker\nlevel: 2\n"
        );
    }

    #[tokio::test]
    async fn test_not_found_falls_back_to_create() {
        let (sync, remote, _) = orchestrator(
            MemoryRemoteService::new(),
            MemoryFileStore::new().with_file("checks/redis.yaml", "name: redis\nhandler: nagios\n"),
        );

        let report = sync.apply("acme", &["checks/redis.yaml".to_string()]).await;

        assert_eq!(report.records[0].outcome, Outcome::Created);
        assert_eq!(
            remote.paths_for(RemoteMethod::Create),
            vec!["/accounts/acme/checks"]
        );
        let stored = remote.document("/accounts/acme/checks/redis").unwrap();
        assert!(String::from_utf8(stored).unwrap().contains("format: nagios"));
    }

    #[tokio::test]
    async fn test_failed_create_is_terminal() {
        let (sync, remote, _) = orchestrator(
            MemoryRemoteService::new().with_status(
                "/accounts/acme/dashboards",
                500,
                "status: 500\ndetail: database offline\n",
            ),
            MemoryFileStore::new().with_file("dashboards/docker.yaml", "name: docker"),
        );

        let report = sync.apply("acme", &["dashboards/docker.yaml".to_string()]).await;

        match &report.records[0].outcome {
            Outcome::Failed(reason) => assert!(reason.contains("database offline")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(remote.paths_for(RemoteMethod::Create).len(), 1);
        assert_eq!(remote.paths_for(RemoteMethod::Update).len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_its_record_only() {
        let (sync, _, _) = orchestrator(
            MemoryRemoteService::new(),
            MemoryFileStore::new().with_file("alerts/a.yaml", "name: a"),
        );

        let report = sync
            .apply(
                "acme",
                &["alerts/a.yaml".to_string(), "alerts/gone.yaml".to_string()],
            )
            .await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.records[0].outcome, Outcome::Created);
        assert_eq!(report.records[1].outcome.status(), "FAIL");
    }

    #[tokio::test]
    async fn test_export_single_dashboard() {
        let (sync, remote, store) = orchestrator(
            MemoryRemoteService::new()
                .with_document("/accounts/acme/dashboards/docker", "name: docker\nwidgets: []\n"),
            MemoryFileStore::new(),
        );

        let selectors = vec![ExportSelector::single(ResourceKind::Dashboards, "docker")];
        let report = sync.export("acme", &selectors, "demo").await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.records[0].outcome, Outcome::Written);
        assert_eq!(
            remote.paths_for(RemoteMethod::Get),
            vec!["/accounts/acme/dashboards/docker?view=export"]
        );
        assert_eq!(store.file_paths(), vec!["demo/dashboards/docker.yaml"]);
        assert_eq!(
            store.file("demo/dashboards/docker.yaml").unwrap(),
            b"name: docker\nwidgets: []\n"
        );
    }

    #[tokio::test]
    async fn test_export_missing_resource_is_a_failed_row() {
        let (sync, _, store) = orchestrator(MemoryRemoteService::new(), MemoryFileStore::new());

        let selectors = vec![ExportSelector::single(ResourceKind::Alerts, "ghost")];
        let report = sync.export("acme", &selectors, "out").await.unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.records[0].resource(), "alerts/ghost");
        assert!(!report.all_succeeded());
        assert!(store.file_paths().is_empty());
    }

    #[tokio::test]
    async fn test_nameless_document_fails_alone() {
        let (sync, _, store) = orchestrator(
            MemoryRemoteService::new().with_document(
                "/accounts/acme/alerts",
                "- name: docker\n- title: nameless\n- name: redis\n",
            ),
            MemoryFileStore::new(),
        );

        let selectors = vec![ExportSelector::collection(ResourceKind::Alerts)];
        let report = sync.export("acme", &selectors, "out").await.unwrap();

        assert_eq!(
            store.file_paths(),
            vec!["out/alerts/docker.yaml", "out/alerts/redis.yaml"]
        );
        assert_eq!(report.len(), 3);
        assert_eq!(report.failures(), 1);
        let failed = report
            .records
            .iter()
            .find(|r| !r.outcome.is_success())
            .unwrap();
        assert_eq!(failed.resource(), "alerts[1]");
        assert!(failed.outcome.reason().contains("'name'"));
    }

    #[tokio::test]
    async fn test_export_unwritable_root_is_fatal() {
        let (sync, remote, _) = orchestrator(
            MemoryRemoteService::new(),
            MemoryFileStore::new().deny_writes("locked"),
        );

        let selectors = vec![ExportSelector::collection(ResourceKind::Alerts)];
        let err = sync.export("acme", &selectors, "locked").await.unwrap_err();

        assert!(matches!(err, SyncError::Store(_)));
        assert!(remote.calls().is_empty());
    }
}
