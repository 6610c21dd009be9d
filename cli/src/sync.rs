//! One synchronization run.

use crate::config::Config;
use crate::confirm::Confirm;
use crate::error::{AppError, Result};
use crate::loader::load_documents;
use crate::preview::render_changes;
use crate::target::Target;
use allowlist_engine::introspection::INTROSPECTION_QUERY_NAME;
use allowlist_engine::{build_collection, clock, introspection_entry, plan_sync, SyncPlan};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Named operations found in the source documents
    pub found: usize,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Whether the introspection query was part of the fresh collection
    pub introspection: bool,
}

impl RunReport {
    fn new(found: usize, introspection: bool, plan: &SyncPlan) -> Self {
        Self {
            found,
            added: plan.added.len(),
            updated: plan.updated.len(),
            deleted: plan.deleted.len(),
            unchanged: plan.unchanged,
            introspection,
        }
    }
}

/// Load, plan and apply a sync as described by `config`.
///
/// Unversioned updates overwrite published queries, so they go through
/// `confirm` first.
pub async fn run(config: &Config, confirm: &impl Confirm) -> Result<RunReport> {
    let documents = load_documents(&config.paths)?;
    let mut fresh = build_collection(&documents)?;
    let found = fresh.len();
    tracing::info!(
        documents = documents.len(),
        queries = found,
        "collection built"
    );

    let introspection = config.allow_introspection
        && !fresh.iter().any(|entry| entry.name == INTROSPECTION_QUERY_NAME);
    if introspection {
        fresh.push(introspection_entry());
    }

    let target = Target::from_config(&config.target);
    let snapshot = target.load(&config.collection).await?;
    tracing::info!(
        collection = %config.collection,
        queries = snapshot.queries.len(),
        "current collection loaded"
    );

    let plan = plan_sync(&snapshot.queries, &fresh, &config.sync, clock::now_millis())?;
    for entry in &plan.added {
        tracing::info!(query = %entry.name, "adding");
    }
    for entry in &plan.updated {
        tracing::info!(query = %entry.name, "updating");
    }
    for entry in &plan.deleted {
        tracing::info!(query = %entry.name, "deleting");
    }

    if plan.requires_confirmation() {
        let message = format!(
            "{}\n{} published {} changed and will be replaced. Continue?",
            render_changes(&snapshot.queries, &plan.updated),
            plan.updated.len(),
            if plan.updated.len() == 1 { "query has" } else { "queries have" }
        );
        if !confirm.confirm(&message).map_err(AppError::Prompt)? {
            return Err(AppError::Aborted);
        }
    }

    target
        .apply(&config.collection, &snapshot, &plan, config.sync.reset)
        .await?;

    let report = RunReport::new(found, introspection, &plan);
    tracing::info!(
        found = report.found,
        added = report.added,
        updated = report.updated,
        deleted = report.deleted,
        unchanged = report.unchanged,
        "sync finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use crate::confirm::AutoConfirm;
    use allowlist_engine::metadata::read_collections;
    use allowlist_engine::{SyncOptions, VersionTag, DEFAULT_COLLECTION};
    use std::cell::RefCell;
    use std::io;
    use std::path::{Path, PathBuf};

    struct Decline;

    /// Approves and keeps the prompt it was shown.
    #[derive(Default)]
    struct Record(RefCell<String>);

    impl Confirm for Record {
        fn confirm(&self, message: &str) -> io::Result<bool> {
            self.0.replace(message.to_string());
            Ok(true)
        }
    }

    impl Confirm for Decline {
        fn confirm(&self, _message: &str) -> io::Result<bool> {
            Ok(false)
        }
    }

    fn config(sources: &Path, collection_file: PathBuf) -> Config {
        Config {
            target: TargetConfig::File(collection_file),
            paths: vec![sources.to_path_buf()],
            collection: DEFAULT_COLLECTION.to_string(),
            force_replace: false,
            allow_introspection: false,
            sync: SyncOptions::default(),
        }
    }

    fn written(path: &Path) -> Vec<String> {
        let collections = read_collections(&std::fs::read_to_string(path).unwrap()).unwrap();
        collections[0]
            .definition
            .queries
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn first_run_adds_everything() {
        let sources = tempfile::tempdir().unwrap();
        std::fs::write(
            sources.path().join("users.graphql"),
            "query GetUser { user { ...UserParts } } fragment UserParts on User { id }",
        )
        .unwrap();
        let out = tempfile::tempdir().unwrap();
        let file = out.path().join("collections.json");

        let report = run(&config(sources.path(), file.clone()), &AutoConfirm)
            .await
            .unwrap();
        assert_eq!(report.found, 1);
        assert_eq!(report.added, 1);
        assert_eq!(written(&file), vec!["GetUser"]);

        let again = run(&config(sources.path(), file), &AutoConfirm)
            .await
            .unwrap();
        assert_eq!(again.added, 0);
        assert_eq!(again.unchanged, 1);
    }

    #[tokio::test]
    async fn declined_replacement_aborts() {
        let sources = tempfile::tempdir().unwrap();
        let source = sources.path().join("a.graphql");
        std::fs::write(&source, "query A { a }").unwrap();
        let out = tempfile::tempdir().unwrap();
        let file = out.path().join("collections.json");
        let config = config(sources.path(), file.clone());
        run(&config, &AutoConfirm).await.unwrap();

        std::fs::write(&source, "query A { b }").unwrap();
        let err = run(&config, &Decline).await.unwrap_err();
        assert!(matches!(err, AppError::Aborted));

        let report = run(&config, &AutoConfirm).await.unwrap();
        assert_eq!(report.updated, 1);
    }

    #[tokio::test]
    async fn prompt_shows_line_diff_of_changed_queries() {
        let sources = tempfile::tempdir().unwrap();
        let source = sources.path().join("a.graphql");
        std::fs::write(&source, "query A { a }").unwrap();
        let out = tempfile::tempdir().unwrap();
        let config = config(sources.path(), out.path().join("collections.json"));
        run(&config, &AutoConfirm).await.unwrap();

        std::fs::write(&source, "query A { b }").unwrap();
        let record = Record::default();
        run(&config, &record).await.unwrap();

        let prompt = record.0.into_inner();
        assert!(prompt.starts_with("A has changed\n--- remote\n+++ local\n"));
        assert!(prompt.contains("\n-  a\n+  b\n"));
        assert!(prompt.ends_with("1 published query has changed and will be replaced. Continue?"));
    }

    #[tokio::test]
    async fn versioned_run_skips_confirmation() {
        let sources = tempfile::tempdir().unwrap();
        let source = sources.path().join("a.graphql");
        std::fs::write(&source, "query A { a }").unwrap();
        let out = tempfile::tempdir().unwrap();
        let file = out.path().join("collections.json");

        let mut config = config(sources.path(), file.clone());
        config.sync.version = Some(VersionTag::new("v1").unwrap());
        run(&config, &Decline).await.unwrap();

        std::fs::write(&source, "query A { b }").unwrap();
        config.sync.version = Some(VersionTag::new("v2").unwrap());
        let report = run(&config, &Decline).await.unwrap();
        assert_eq!(report.updated, 1);

        let names = written(&file);
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.starts_with("A___(")));
    }

    #[tokio::test]
    async fn introspection_is_added_once() {
        let sources = tempfile::tempdir().unwrap();
        std::fs::write(sources.path().join("a.graphql"), "query A { a }").unwrap();
        let out = tempfile::tempdir().unwrap();
        let file = out.path().join("collections.json");

        let mut config = config(sources.path(), file.clone());
        config.allow_introspection = true;
        let report = run(&config, &AutoConfirm).await.unwrap();
        assert!(report.introspection);
        assert_eq!(report.found, 1);
        assert_eq!(report.added, 2);
        assert_eq!(written(&file), vec!["A", INTROSPECTION_QUERY_NAME]);
    }
}
