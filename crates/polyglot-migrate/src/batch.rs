//! Project analysis
//!
//! [`analyze_project`] transpiles a set of files on a bounded pool of scoped
//! OS threads and summarises what is left for a person to do: unmappable
//! constructs by category and code, a complexity class per file and a rough
//! estimate of manual review time.

use crate::diagnostics::{Category, Severity};
use crate::dialects::DialectType;
use crate::error::{Error, Result};
use crate::transpiler::{Engine, TranspileRequest, TranspileResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Review minutes per diagnostic severity and per failed statement
const MINUTES_PER_ERROR: u32 = 15;
const MINUTES_PER_WARNING: u32 = 5;
const MINUTES_PER_FAILED_STATEMENT: u32 = 30;

/// One input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub sql: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sql: sql.into(),
        }
    }
}

/// How much manual attention a file needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    /// Converted without errors or warnings
    Low,
    /// Warnings only
    Medium,
    /// A few errors
    High,
    /// Failed statements or many errors
    VeryHigh,
}

impl Complexity {
    pub fn classify(result: &TranspileResult) -> Self {
        let errors = result.report.error_count;
        match (result.summary.failed, errors, result.report.warning_count) {
            (0, 0, 0) => Complexity::Low,
            (0, 0, _) => Complexity::Medium,
            (0, 1..=3, _) => Complexity::High,
            _ => Complexity::VeryHigh,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::VeryHigh => "very high",
        }
    }
}

/// Analysis of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub path: String,
    pub result: TranspileResult,
    pub complexity: Complexity,
    pub review_minutes: u32,
}

/// Totals across a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub source: Option<DialectType>,
    pub files: usize,
    pub statements: usize,
    pub failed_statements: usize,
    /// Error diagnostics by category
    pub unmappable_by_category: BTreeMap<Category, usize>,
    /// Error diagnostics by code
    pub unmappable_by_code: BTreeMap<String, usize>,
    pub files_by_complexity: BTreeMap<Complexity, usize>,
    pub review_minutes: u32,
}

/// Result of [`analyze_project`], files in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub files: Vec<FileResult>,
    pub summary: ProjectSummary,
}

fn review_minutes(result: &TranspileResult) -> u32 {
    let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    count(result.report.error_count)
        .saturating_mul(MINUTES_PER_ERROR)
        .saturating_add(count(result.report.warning_count).saturating_mul(MINUTES_PER_WARNING))
        .saturating_add(count(result.summary.failed).saturating_mul(MINUTES_PER_FAILED_STATEMENT))
}

fn analyze_file(engine: &Engine, file: &SourceFile, source: DialectType) -> Result<FileResult> {
    let mut result = engine.transpile(&TranspileRequest::new(file.sql.as_str(), source))?;
    for entry in &mut result.report.entries {
        entry.file = Some(file.path.clone());
    }
    Ok(FileResult {
        path: file.path.clone(),
        complexity: Complexity::classify(&result),
        review_minutes: review_minutes(&result),
        result,
    })
}

/// Transpile every file from `source` and summarise the outcome.
///
/// Files are handed out to `engine.config().effective_workers()` threads.
/// An unsupported source dialect fails the whole call; problems inside files
/// are reported per file.
#[instrument(skip(engine, files), fields(files = files.len()))]
pub fn analyze_project(engine: &Engine, files: &[SourceFile], source: DialectType) -> Result<ProjectAnalysis> {
    engine.dialect(source)?;
    let workers = engine.config().effective_workers().clamp(1, files.len().max(1));
    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<Result<FileResult>>>> = Mutex::new((0..files.len()).map(|_| None).collect());

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(file) = files.get(index) else {
                    break;
                };
                debug!(path = %file.path, "analyzing file");
                let analyzed = analyze_file(engine, file, source);
                if let Ok(mut slots) = slots.lock() {
                    slots[index] = Some(analyzed);
                }
            });
        }
    });

    let slots = slots
        .into_inner()
        .map_err(|_| Error::internal("worker panicked during project analysis"))?;
    let mut results = Vec::with_capacity(files.len());
    for slot in slots {
        match slot {
            Some(result) => results.push(result?),
            None => return Err(Error::internal("file left unanalyzed")),
        }
    }
    let summary = summarize(&results, source);
    Ok(ProjectAnalysis {
        files: results,
        summary,
    })
}

fn summarize(files: &[FileResult], source: DialectType) -> ProjectSummary {
    let mut summary = ProjectSummary {
        source: Some(source),
        files: files.len(),
        ..ProjectSummary::default()
    };
    for file in files {
        summary.statements += file.result.summary.statements;
        summary.failed_statements += file.result.summary.failed;
        summary.review_minutes = summary.review_minutes.saturating_add(file.review_minutes);
        *summary.files_by_complexity.entry(file.complexity).or_insert(0) += 1;
        for entry in file.result.report.entries.iter().filter(|d| d.severity == Severity::Error) {
            *summary.unmappable_by_category.entry(entry.category).or_insert(0) += 1;
            *summary.unmappable_by_code.entry(entry.code.clone()).or_insert(0) += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use pretty_assertions::assert_eq;

    fn engine(workers: usize) -> Engine {
        Engine::from_config(EngineConfig {
            workers,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn project() -> Vec<SourceFile> {
        vec![
            SourceFile::new("clean.sql", "SELECT TOP 5 name FROM customers"),
            SourceFile::new("broken.sql", "SELECT a FROM t; SELECT FROM WHERE"),
            SourceFile::new("nulls.sql", "SELECT a FROM t WHERE b = NULL"),
        ]
    }

    #[test]
    fn test_project_summary() {
        let analysis = analyze_project(&engine(2), &project(), DialectType::SqlServer).unwrap();
        let paths: Vec<&str> = analysis.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["clean.sql", "broken.sql", "nulls.sql"]);
        assert_eq!(analysis.files[0].complexity, Complexity::Low);
        assert_eq!(analysis.files[1].complexity, Complexity::VeryHigh);
        assert_eq!(analysis.files[2].complexity, Complexity::Medium);

        let summary = &analysis.summary;
        assert_eq!(summary.files, 3);
        assert_eq!(summary.statements, 4);
        assert_eq!(summary.failed_statements, 1);
        assert_eq!(summary.unmappable_by_category.get(&Category::Parse), Some(&1));
        assert_eq!(summary.unmappable_by_code.get("PARSE_ERROR"), Some(&1));
        assert!(summary.review_minutes >= MINUTES_PER_ERROR + MINUTES_PER_FAILED_STATEMENT + MINUTES_PER_WARNING);
        assert!(analysis.files[1]
            .result
            .report
            .entries
            .iter()
            .all(|d| d.file.as_deref() == Some("broken.sql")));
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let one = analyze_project(&engine(1), &project(), DialectType::SqlServer).unwrap();
        let four = analyze_project(&engine(4), &project(), DialectType::SqlServer).unwrap();
        assert_eq!(one, four);
    }

    #[test]
    fn test_empty_project() {
        let analysis = analyze_project(&engine(0), &[], DialectType::Oracle).unwrap();
        assert!(analysis.files.is_empty());
        assert_eq!(analysis.summary.review_minutes, 0);
    }
}
