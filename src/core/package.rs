//! Package processing
//!
//! A package is a remote folder whose documents are scanned together against
//! one set of KPI definitions. Items arrive one at a time:
//!
//! - folders are listed and their children processed recursively
//! - `.docx`, `.xlsx` and `.pdf` files are downloaded and scanned
//! - anything else is ignored
//!
//! A document that cannot be decoded is logged and skipped. Transport,
//! authentication and download failures abort the package. When the package
//! is finished only the confirmed findings are kept.

use crate::adapters::graph::GraphClient;
use crate::config::{DocsiftConfig, ExtractionConfig};
use crate::core::extract::{DocumentKind, DocxDocument, PdfConverter, TableOptions, XlsxWorkbook};
use crate::core::scan::KpiScanner;
use crate::domain::{
    DocsiftError, FindingSet, KpiDefinition, PackageResult, RemoteItem, Result, ShutdownSignal,
    WalkPath,
};
use crate::{log_document_skipped, log_package_complete};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::io::BufReader;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Where package contents come from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn list_children(&self, folder_id: &str, signal: &ShutdownSignal)
        -> Result<Vec<RemoteItem>>;

    async fn download(&self, item_id: &str, signal: &ShutdownSignal) -> Result<NamedTempFile>;
}

#[async_trait]
impl DocumentSource for GraphClient {
    async fn list_children(
        &self,
        folder_id: &str,
        signal: &ShutdownSignal,
    ) -> Result<Vec<RemoteItem>> {
        GraphClient::list_children(self, folder_id, signal).await
    }

    async fn download(&self, item_id: &str, signal: &ShutdownSignal) -> Result<NamedTempFile> {
        GraphClient::download(self, item_id, signal).await
    }
}

/// Scans a single local document into a finding set
#[derive(Debug, Clone)]
pub struct DocumentScanner {
    scanner: Arc<KpiScanner>,
    table: TableOptions,
    pdf: PdfConverter,
    extraction: ExtractionConfig,
}

impl DocumentScanner {
    pub fn from_config(config: &DocsiftConfig) -> Result<Self> {
        Ok(Self {
            scanner: Arc::new(KpiScanner::new()?),
            table: TableOptions {
                spill_threshold_bytes: config.extraction.spill_threshold_bytes,
                scratch_dir: config.application.scratch_dir(),
            },
            pdf: PdfConverter::new(&config.extraction.pdf_converter),
            extraction: config.extraction.clone(),
        })
    }

    /// The format of `item`, if it is one that gets scanned
    pub fn kind_of(&self, item: &RemoteItem) -> Option<DocumentKind> {
        let extension = item.extension();
        if !self.extraction.accepts(&extension) {
            return None;
        }
        DocumentKind::from_extension(&extension)
    }

    /// Scan `file` as a document of `kind`
    ///
    /// Returns the number of paragraphs, cells or lines scanned. Findings
    /// confirmed before a decode error are kept.
    pub async fn scan(
        &self,
        kind: DocumentKind,
        file: std::fs::File,
        findings: &mut FindingSet,
        signal: &ShutdownSignal,
    ) -> Result<usize> {
        match kind {
            DocumentKind::Pdf => {
                let scanner = &self.scanner;
                self.pdf
                    .convert_lines(file, signal, |line| {
                        let mut text = String::with_capacity(line.len() + 1);
                        text.push_str(line);
                        text.push('\n');
                        scanner.scan_text(&text, findings);
                        Ok(())
                    })
                    .await
            }
            DocumentKind::Docx | DocumentKind::Xlsx => {
                let scanner = Arc::clone(&self.scanner);
                let table = self.table.clone();
                let signal = signal.clone();
                let mut local = findings.clone();

                let (local, outcome) = tokio::task::spawn_blocking(move || {
                    let outcome =
                        scan_container(kind, file, &scanner, &mut local, &table, &signal);
                    (local, outcome)
                })
                .await
                .map_err(|e| DocsiftError::Other(format!("Extraction task failed: {e}")))?;

                *findings = local;
                outcome
            }
        }
    }
}

fn scan_container(
    kind: DocumentKind,
    file: std::fs::File,
    scanner: &KpiScanner,
    findings: &mut FindingSet,
    table: &TableOptions,
    signal: &ShutdownSignal,
) -> Result<usize> {
    let reader = BufReader::new(file);
    match kind {
        DocumentKind::Docx => {
            let mut document = DocxDocument::open(reader)?;
            let mut paragraphs = 0;
            for paragraph in document.paragraphs()? {
                signal.check()?;
                scanner.scan_text(&paragraph?, findings);
                paragraphs += 1;
            }
            Ok(paragraphs)
        }
        DocumentKind::Xlsx => {
            let mut workbook = XlsxWorkbook::open(reader)?;
            workbook.scan_cells(table, |value| {
                signal.check()?;
                scanner.scan_cell(value, findings);
                Ok(())
            })
        }
        DocumentKind::Pdf => Err(DocsiftError::Other(
            "PDF documents are scanned through the converter".to_string(),
        )),
    }
}

/// State of one package scan
pub struct PackageScan {
    package_name: String,
    walk: WalkPath,
    findings: FindingSet,
    documents: usize,
    skipped: usize,
    started: Instant,
}

impl PackageScan {
    pub fn findings(&self) -> &FindingSet {
        &self.findings
    }

    /// Documents scanned successfully so far
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Documents skipped because they could not be decoded
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Discard unconfirmed findings and produce the package result
    pub fn finish(self) -> PackageOutcome {
        let findings = self.findings.into_found();
        log_package_complete!(
            self.package_name,
            self.documents,
            findings.len(),
            self.started.elapsed()
        );

        PackageOutcome {
            result: PackageResult {
                package_name: self.package_name,
                date_parsed: Utc::now().date_naive(),
                year: self.walk.year,
                business_unit: self.walk.business_unit,
                division: self.walk.division,
                findings,
            },
            documents: self.documents,
            skipped: self.skipped,
        }
    }
}

/// A finished package scan
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    pub result: PackageResult,
    /// Documents scanned successfully
    pub documents: usize,
    /// Documents skipped because they could not be decoded
    pub skipped: usize,
}

/// Downloads and scans the documents of a package
pub struct PackageProcessor {
    source: Arc<dyn DocumentSource>,
    documents: DocumentScanner,
    definitions: Vec<Arc<KpiDefinition>>,
}

impl PackageProcessor {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        documents: DocumentScanner,
        definitions: Vec<Arc<KpiDefinition>>,
    ) -> Self {
        Self {
            source,
            documents,
            definitions,
        }
    }

    /// Start a scan with every finding unconfirmed
    pub fn begin(&self, package_name: impl Into<String>, walk: WalkPath) -> PackageScan {
        PackageScan {
            package_name: package_name.into(),
            walk,
            findings: FindingSet::new(&self.definitions),
            documents: 0,
            skipped: 0,
            started: Instant::now(),
        }
    }

    /// List a package folder and scan everything beneath it
    pub async fn scan_package(
        &self,
        package: &RemoteItem,
        walk: WalkPath,
        signal: &ShutdownSignal,
    ) -> Result<PackageOutcome> {
        tracing::info!(package = %package.name, item_id = %package.id, "Scanning package");

        let mut scan = self.begin(&package.name, walk);
        let children = self
            .source
            .list_children(&package.id, signal)
            .await
            .map_err(|e| e.for_item(&package.id, &package.name))?;

        for child in &children {
            self.process_item(&mut scan, child, signal).await?;
        }
        Ok(scan.finish())
    }

    /// Process one item of a package
    pub fn process_item<'a>(
        &'a self,
        scan: &'a mut PackageScan,
        item: &'a RemoteItem,
        signal: &'a ShutdownSignal,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            signal.check()?;

            if item.is_folder {
                tracing::debug!(item_id = %item.id, name = %item.name, "Descending into folder");
                let children = self
                    .source
                    .list_children(&item.id, signal)
                    .await
                    .map_err(|e| e.for_item(&item.id, &item.name))?;
                for child in &children {
                    self.process_item(scan, child, signal).await?;
                }
                return Ok(());
            }

            let Some(kind) = self.documents.kind_of(item) else {
                tracing::debug!(item_id = %item.id, name = %item.name, "Ignoring unsupported item");
                return Ok(());
            };
            if scan.findings.all_found() {
                tracing::debug!(item_id = %item.id, "All KPIs confirmed, skipping download");
                return Ok(());
            }

            let scratch = self
                .source
                .download(&item.id, signal)
                .await
                .map_err(|e| e.for_item(&item.id, &item.name))?;
            let file = scratch.as_file().try_clone()?;

            match self
                .documents
                .scan(kind, file, &mut scan.findings, signal)
                .await
            {
                Ok(units) => {
                    scan.documents += 1;
                    tracing::debug!(item_id = %item.id, name = %item.name, units, "Scanned document");
                }
                Err(e) if e.is_document_error() => {
                    scan.skipped += 1;
                    log_document_skipped!(item.id, item.name, e);
                }
                Err(e) => return Err(e.for_item(&item.id, &item.name)),
            }
            drop(scratch);
            Ok(())
        }
        .boxed()
    }
}
