//! Conversion report: what a `convert` run wrote, skipped and dropped.
//!
//! Per-annotation quality problems never fail a run. They end up here as
//! counts and as issues with stable codes, so scripts can consume the JSON
//! form without parsing messages.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::materialize::MaterializeReport;

/// A report generated by a conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Class names in class index order.
    pub classes: Vec<String>,
    pub box_policy: String,
    /// One entry per split, in the order they were processed.
    pub splits: Vec<SplitSummary>,
    /// Descriptor file written at the end of the run.
    pub descriptor: Option<PathBuf>,
    pub issues: Vec<ConversionIssue>,
}

/// Result of one split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitSummary {
    pub name: String,
    pub status: SplitStatus,
    /// Present when the split was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<MaterializeReport>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStatus {
    Written,
    AlreadySplit,
    InsufficientData,
}

impl ConversionReport {
    pub fn new(classes: Vec<String>, box_policy: impl Into<String>) -> Self {
        Self {
            classes,
            box_policy: box_policy.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Record a written split and turn its drop counts into issues.
    pub fn record_written(&mut self, counts: MaterializeReport) {
        let split = counts.split.clone();

        if counts.degenerate_boxes > 0 {
            self.add(ConversionIssue::warning(
                ConversionIssueCode::DegenerateBoxesDropped,
                format!(
                    "{split}: {} degenerate box(es) dropped",
                    counts.degenerate_boxes
                ),
            ));
        }
        if counts.outside_boxes > 0 {
            self.add(ConversionIssue::warning(
                ConversionIssueCode::OutsideBoxesDropped,
                format!(
                    "{split}: {} box(es) outside the image dropped ({} policy)",
                    counts.outside_boxes, self.box_policy
                ),
            ));
        }
        if !counts.unknown_categories.is_empty() {
            let ids: Vec<String> = counts
                .unknown_categories
                .keys()
                .map(|id| id.to_string())
                .collect();
            self.add(ConversionIssue::warning(
                ConversionIssueCode::UnknownCategoriesDropped,
                format!(
                    "{split}: {} annotation(s) with unknown category id(s) {} dropped",
                    counts.unknown_category_total(),
                    ids.join(", ")
                ),
            ));
        }
        if !counts.dimension_mismatches.is_empty() {
            self.add(ConversionIssue::warning(
                ConversionIssueCode::DimensionMismatch,
                format!(
                    "{split}: {} image(s) differ from their declared size: {}",
                    counts.dimension_mismatches.len(),
                    counts.dimension_mismatches.join(", ")
                ),
            ));
        }

        self.splits.push(SplitSummary {
            name: split,
            status: SplitStatus::Written,
            counts: Some(counts),
        });
    }

    pub fn record_already_split(&mut self, split: &str, destination: &Path) {
        self.add(ConversionIssue::info(
            ConversionIssueCode::SplitAlreadyPresent,
            format!(
                "{split}: {} already populated, left untouched",
                destination.display()
            ),
        ));
        self.splits.push(SplitSummary {
            name: split.to_string(),
            status: SplitStatus::AlreadySplit,
            counts: None,
        });
    }

    pub fn record_insufficient(&mut self, split: &str) {
        self.add(ConversionIssue::warning(
            ConversionIssueCode::InsufficientData,
            format!("{split}: no images assigned, nothing written"),
        ));
        self.splits.push(SplitSummary {
            name: split.to_string(),
            status: SplitStatus::InsufficientData,
            counts: None,
        });
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Summary for a split by name.
    pub fn split(&self, name: &str) -> Option<&SplitSummary> {
        self.splits.iter().find(|s| s.name == name)
    }

    pub fn has_issue(&self, code: ConversionIssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} classes: {}",
            self.classes.len(),
            self.classes.join(", ")
        )?;

        for split in &self.splits {
            match (&split.status, &split.counts) {
                (SplitStatus::Written, Some(counts)) => writeln!(
                    f,
                    "  {:<6} {} images, {} labels ({} empty label files)",
                    split.name, counts.images, counts.labels_written, counts.empty_label_files
                )?,
                (SplitStatus::AlreadySplit, _) => {
                    writeln!(f, "  {:<6} skipped (already split)", split.name)?
                }
                _ => writeln!(f, "  {:<6} nothing written", split.name)?,
            }
        }

        if let Some(descriptor) = &self.descriptor {
            writeln!(f, "  descriptor: {}", descriptor.display())?;
        }

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// A single issue discovered during a run.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Something was dropped or could not be verified.
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// A note about what the run decided; nothing was lost.
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON output and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// Boxes with no extent after normalization.
    DegenerateBoxesDropped,
    /// Boxes rejected by the clip or drop policy.
    OutsideBoxesDropped,
    /// Annotations whose category id is not in the class map.
    UnknownCategoriesDropped,
    /// Declared image size differs from the file header.
    DimensionMismatch,
    /// A split directory already existed and was skipped.
    SplitAlreadyPresent,
    /// A split received no images.
    InsufficientData,
    /// A document's category ids differ from the shared class map.
    VocabularyMismatch,
    /// Where the class map came from.
    ClassMapSource,
}
