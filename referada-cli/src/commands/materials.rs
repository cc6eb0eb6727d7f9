//! Materials command - download new course materials.

use std::future::Future;
use std::sync::Arc;

use clap::Args;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use referada::fetch::{BatchReport, RemoteFiles, DEFAULT_SEMESTER_FILTER};
use referada::portal::{PortalClient, PortalConfig, PortalError};
use referada::{
    merge_snapshot, parse_materials, FetchConfig, FetchOrchestrator, SemesterFilter, SessionToken,
    SnapshotStore,
};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the materials command.
#[derive(Debug, Args)]
pub struct MaterialsArgs {
    /// Portal session token (PHPSESSID cookie value)
    #[arg(long, env = "REFERADA_SESSION", hide_env_values = true)]
    pub session: Option<String>,
}

/// Run the materials command.
pub fn run(args: MaterialsArgs, verbose: bool) -> Result<(), CliError> {
    let session = args
        .session
        .filter(|s| !s.trim().is_empty())
        .map(SessionToken::new)
        .ok_or(CliError::MissingSession)?;

    let runner = CliRunner::new(verbose)?;
    runner.log_startup("materials");
    let config = runner.config();

    let filter: SemesterFilter = DEFAULT_SEMESTER_FILTER.parse()?;
    let output_dir = match config.download.output_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| CliError::Config(format!("Cannot determine current directory: {}", e)))?,
    };
    let store = SnapshotStore::new(config.state.snapshot_file.clone());
    let portal = Arc::new(PortalClient::new(PortalConfig::from(&config.portal))?);

    println!("Referada v{}", referada::VERSION);
    println!("Semester:   {}", filter);
    println!("Output:     {}", output_dir.display());
    println!();

    // Set up signal handler for graceful abort
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received interrupt, aborting downloads...");
        on_signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = runner.runtime()?;
    runtime.block_on(sync_materials(
        portal.fetch_materials(&session),
        portal.clone(),
        &session,
        &store,
        FetchConfig::new(output_dir),
        &filter,
        cancel,
    ))
}

/// Parse `listing`, download what is new and persist the snapshot.
///
/// The snapshot is written even when `cancel` interrupts the batch, so files
/// that finished before the interrupt are not fetched again.
async fn sync_materials<L>(
    listing: L,
    remote: Arc<dyn RemoteFiles>,
    session: &SessionToken,
    store: &SnapshotStore,
    fetch: FetchConfig,
    filter: &SemesterFilter,
    cancel: CancellationToken,
) -> Result<(), CliError>
where
    L: Future<Output = Result<Value, PortalError>>,
{
    let raw = tokio::select! {
        _ = cancel.cancelled() => return Err(CliError::Interrupted),
        raw = listing => raw?,
    };
    let mut catalog = parse_materials(raw)?;

    let snapshot = store.read_or_empty().await;
    let stats = merge_snapshot(&snapshot, &mut catalog);
    drop(snapshot);
    println!(
        "Catalog: {} courses, {} files ({} already downloaded)",
        catalog.len(),
        catalog.file_count(),
        stats.flags_recovered
    );

    let orchestrator = FetchOrchestrator::new(remote, fetch);
    let report = orchestrator.run(session, &catalog, filter, cancel).await;

    let marked = report.apply(&mut catalog);
    store.write(&catalog).await?;
    tracing::info!(marked, path = %store.path().display(), "Snapshot saved");

    print_summary(&report);

    if report.interrupted {
        return Err(CliError::Interrupted);
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("Download Summary");
    println!("────────────────");
    println!("  Selected:   {}", report.selected());
    println!("  Completed:  {}", report.done_count());
    println!("  Failed:     {}", report.failed_count());
    if report.aborted_count() > 0 {
        println!("  Aborted:    {}", report.aborted_count());
        for path in report.incomplete_paths() {
            println!("    may be incomplete: {}", path.display());
        }
    }
    if report.lost_units > 0 {
        println!("  Lost:       {} (see log)", report.lost_units);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use bytes::Bytes;
    use referada::fetch::{BoxFuture, ByteStream, FetchError};
    use referada::FileKey;
    use serde_json::json;
    use tempfile::TempDir;

    /// Serves listed bodies; every other request waits forever for headers.
    struct SlowPortal {
        bodies: HashMap<String, Vec<u8>>,
    }

    impl RemoteFiles for SlowPortal {
        fn open<'a>(
            &'a self,
            url: &'a str,
            _session: &'a SessionToken,
        ) -> BoxFuture<'a, Result<ByteStream, FetchError>> {
            Box::pin(async move {
                match self.bodies.get(url) {
                    Some(body) => {
                        let chunk = Ok::<_, FetchError>(Bytes::from(body.clone()));
                        Ok(Box::pin(futures::stream::iter(vec![chunk])) as ByteStream)
                    }
                    None => {
                        futures::future::pending::<()>().await;
                        unreachable!("pending future resolved")
                    }
                }
            })
        }
    }

    fn listing(file_ids: std::ops::Range<u64>) -> Value {
        let materials: Vec<Value> = file_ids
            .map(|id| {
                json!({
                    "id": id,
                    "naziv": format!("{}.pdf", id),
                    "opis": null,
                    "velicina": 6,
                    "vrijeme": "2022-10-03 09:15:00",
                    "korisnika": "Ivana Horvat",
                    "contentType": "application/pdf",
                    "link": format!("materijali/{}", id),
                    "kategorija": "Predavanja",
                })
            })
            .collect();

        json!({"data": [{
            "akademskaGodina": "2022/2023",
            "semestar": "Zimski",
            "godine": [{
                "studij": "Računarstvo",
                "smjer": "Programsko inženjerstvo",
                "godina": 2,
                "nacin": "Redovni",
                "grupa": "A",
                "predmeti": [{
                    "idPredmet": 7,
                    "predmet": "Mreže",
                    "sifra": "RAC-7",
                    "ects": 5,
                    "potpis": false,
                    "potpisDatum": null,
                    "ocjena": null,
                    "ocjenaOpisno": null,
                    "ocjenaDatum": null,
                    "polozenBezOcjene": false,
                    "polozenBezOcjeneKolokviran": false,
                    "priznat": false,
                    "priznatCertifikat": false,
                    "dodatno": {"materijali": {
                        "brojMaterijala": 5,
                        "zadnjaIzmjenaDanUTjednu": "Utorak",
                        "zadnjaIzmjenaDatum": "2022-10-03",
                        "zadnjaIzmjenaKorisnik": "Ivana Horvat",
                        "kategorije": [{"kategorija": "Predavanja", "materijali": materials}],
                    }},
                }],
            }],
        }]})
    }

    fn winter() -> SemesterFilter {
        DEFAULT_SEMESTER_FILTER.parse().unwrap()
    }

    #[tokio::test]
    async fn test_interrupted_sync_saves_snapshot_and_exits_130() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("materials.json"));
        let portal = Arc::new(SlowPortal {
            bodies: HashMap::from([("materijali/1".to_string(), b"served".to_vec())]),
        });

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = sync_materials(
            async { Ok::<_, PortalError>(listing(1..6)) },
            portal,
            &SessionToken::new("sess"),
            &store,
            FetchConfig::new(temp.path().join("faks")),
            &winter(),
            cancel,
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Interrupted));
        assert_eq!(err.exit_code(), 130);

        let saved = store.read().await.unwrap();
        let flags: Vec<bool> = (1..6)
            .map(|id| {
                saved
                    .file(&FileKey::new("7", "Predavanja", id.to_string()))
                    .unwrap()
                    .downloaded
            })
            .collect();
        assert_eq!(flags, vec![true, false, false, false, false]);
    }

    #[tokio::test]
    async fn test_sync_completes_and_records_downloads() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("materials.json"));
        let bodies = (1..3)
            .map(|id| (format!("materijali/{}", id), b"pdf".to_vec()))
            .collect();
        let portal = Arc::new(SlowPortal { bodies });

        sync_materials(
            async { Ok::<_, PortalError>(listing(1..3)) },
            portal,
            &SessionToken::new("sess"),
            &store,
            FetchConfig::new(temp.path().join("faks")),
            &winter(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let saved = store.read().await.unwrap();
        assert!(saved.files().all(|(_, file)| file.downloaded));
        assert!(temp.path().join("faks/Mreže/Predavanja/2.pdf").exists());
    }
}
