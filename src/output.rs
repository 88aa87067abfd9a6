//! Result types returned by the workflow and the batch extractor.

use crate::validate::{validate_output, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every artifact of a successful run.
///
/// Callers display or persist any subset; the CLI writes `document`, the web
/// UI shows all four Markdown sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// Text extracted from the PDF.
    pub raw_text: String,
    /// Markdown rules summary (factual handle).
    pub structured_rules: String,
    /// Markdown mechanics analysis (factual handle).
    pub analysis: String,
    /// Markdown creative variants (creative handle).
    pub variants: String,
    /// The assembled document.
    pub document: String,
}

impl WorkflowOutput {
    /// Opt-in inspection of the model output. Never fails.
    pub fn validate(&self) -> ValidationReport {
        validate_output(self)
    }
}

/// Outcome for one file of a batch extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    /// File name inside the source directory.
    pub file: String,
    /// Where the text was written, on success.
    pub output: Option<PathBuf>,
    /// Why it failed, on failure.
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Output directory the `.txt` files were written to.
    pub output_dir: PathBuf,
    /// One entry per PDF, in processing (sorted) order.
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    /// Names of the files that failed.
    pub fn failed_files(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !e.is_ok())
            .map(|e| e.file.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_report_counts() {
        let report = BatchReport {
            output_dir: PathBuf::from("output_rules"),
            entries: vec![
                BatchEntry {
                    file: "a.pdf".into(),
                    output: Some("output_rules/a.txt".into()),
                    error: None,
                },
                BatchEntry {
                    file: "b.pdf".into(),
                    output: None,
                    error: Some("corrupt".into()),
                },
            ],
        };
        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed_files(), vec!["b.pdf"]);
    }

    #[test]
    fn workflow_output_is_json_serialisable() {
        let out = WorkflowOutput {
            raw_text: "t".into(),
            structured_rules: "r".into(),
            analysis: "a".into(),
            variants: "v".into(),
            document: "d".into(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["structured_rules"], "r");
        assert_eq!(json["document"], "d");
    }
}
