//! Invoice and credit-note PDF download
//!
//! Runs after reconciliation over an already-built [`ExportBundle`]. At most
//! `workers` downloads are in flight; a failed download is reported and the
//! others carry on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::export::ExportBundle;
use crate::traits::ArtifactFetcher;
use crate::utils::sanitize_filename;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactKind {
    Invoice,
    CreditNote,
}

impl ArtifactKind {
    /// Sub-directory of the output directory
    pub fn directory(&self) -> &'static str {
        match self {
            ArtifactKind::Invoice => "factures",
            ArtifactKind::CreditNote => "avoirs",
        }
    }
}

/// A hosted PDF to save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub document_id: String,
    pub number: String,
    pub url: Option<String>,
}

impl Artifact {
    /// `<number>.pdf`, falling back to the document id
    pub fn file_name(&self) -> String {
        let stem = sanitize_filename(&self.number);
        if stem.is_empty() {
            format!("{}.pdf", sanitize_filename(&self.document_id))
        } else {
            format!("{}.pdf", stem)
        }
    }

    /// Every invoice and credit note of a bundle, in bundle order
    pub fn collect(bundle: &ExportBundle) -> Vec<Artifact> {
        let invoices = bundle.invoices.iter().map(|row| Artifact {
            kind: ArtifactKind::Invoice,
            document_id: row.id.clone(),
            number: row.number.clone(),
            url: row.pdf_url.clone(),
        });
        let credit_notes = bundle.credit_notes.iter().map(|row| Artifact {
            kind: ArtifactKind::CreditNote,
            document_id: row.id.clone(),
            number: row.number.clone(),
            url: row.pdf_url.clone(),
        });
        invoices.chain(credit_notes).collect()
    }
}

/// Outcome of a download run; partial success is normal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    /// `(document id, reason)`
    pub failed: Vec<(String, String)>,
    /// Documents without a hosted PDF
    pub skipped: Vec<String>,
}

impl DownloadReport {
    pub fn success_count(&self) -> usize {
        self.saved.len()
    }
}

/// Downloads artifacts with a bounded number of concurrent fetches
pub struct ArtifactDownloader<F: ArtifactFetcher + 'static> {
    fetcher: Arc<F>,
    output_dir: PathBuf,
    workers: usize,
}

impl<F: ArtifactFetcher + 'static> ArtifactDownloader<F> {
    pub fn new(fetcher: F, output_dir: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            output_dir: output_dir.into(),
            workers: workers.max(1),
        }
    }

    pub fn from_config(fetcher: F, config: &ExportConfig) -> Self {
        Self::new(fetcher, config.output_dir.clone(), config.download_workers)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download the PDFs of a bundle's invoices and credit notes
    pub async fn download_bundle(&self, bundle: &ExportBundle) -> DownloadReport {
        self.download(Artifact::collect(bundle)).await
    }

    pub async fn download(&self, artifacts: Vec<Artifact>) -> DownloadReport {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut report = DownloadReport::default();

        for artifact in artifacts {
            let Some(url) = artifact.url.clone() else {
                report.skipped.push(artifact.document_id);
                continue;
            };
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let fetcher = self.fetcher.clone();
            let dir = self.output_dir.join(artifact.kind.directory());

            tasks.spawn(async move {
                let _permit = permit;
                let result = save_artifact(fetcher.as_ref(), &url, &dir, &artifact.file_name()).await;
                (artifact.document_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(path))) => report.saved.push(path),
                Ok((document_id, Err(reason))) => {
                    warn!(document_id = %document_id, reason = %reason, "artifact download failed");
                    report.failed.push((document_id, reason));
                }
                Err(err) => {
                    warn!(error = %err, "artifact download task aborted");
                    report.failed.push((String::new(), err.to_string()));
                }
            }
        }

        report.saved.sort();
        report.failed.sort();
        info!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "artifact download finished"
        );
        report
    }
}

async fn save_artifact<F: ArtifactFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, String> {
    let bytes = fetcher.fetch(url).await.map_err(|e| e.to_string())?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| e.to_string())?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| e.to_string())?;
    Ok(path)
}
