//! Attribute-array size validation.
//!
//! Every point array should hold one tuple per point and every cell array one
//! tuple per cell. Too few tuples is an error (data would be read past the
//! end); too many is a warning (trailing tuples are ignored). Checking never
//! mutates the dataset and never fails: it returns an [`AttributeReport`]
//! and logs each offending array.

use crate::data::attributes::{AttributeKind, AttributeSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How bad a single size mismatch is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Extra tuples; ignorable.
    Warning,
    /// Missing tuples; data loss.
    Error,
}

/// Overall outcome of a consistency check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValidity {
    /// Every array matches its element count.
    Consistent,
    /// Some arrays hold more tuples than elements, none fewer.
    Excess,
    /// At least one array holds fewer tuples than elements.
    Truncated,
}

impl AttributeValidity {
    /// Return true unless some array is truncated.
    pub fn is_usable(self) -> bool {
        !matches!(self, AttributeValidity::Truncated)
    }
}

/// One array whose tuple count disagrees with its element count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeIssue {
    pub kind: AttributeKind,
    pub name: String,
    pub components: usize,
    pub tuples: usize,
    pub elements: usize,
    pub severity: Severity,
}

impl fmt::Display for AttributeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let element = match self.kind {
            AttributeKind::Point => "points",
            AttributeKind::Cell => "cells",
            AttributeKind::Field => "elements",
        };
        match self.severity {
            Severity::Error => write!(
                f,
                "{} array `{}` with {} components only has {} tuples but there are {} {element}",
                self.kind.as_str(),
                self.name,
                self.components,
                self.tuples,
                self.elements
            ),
            Severity::Warning => write!(
                f,
                "{} array `{}` with {} components has {} tuples but there are only {} {element}",
                self.kind.as_str(),
                self.name,
                self.components,
                self.tuples,
                self.elements
            ),
        }
    }
}

/// Result of [`check_attribute_sizes`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeReport {
    pub validity: AttributeValidity,
    pub issues: Vec<AttributeIssue>,
}

impl AttributeReport {
    /// Report with no issues.
    pub fn consistent() -> Self {
        Self {
            validity: AttributeValidity::Consistent,
            issues: Vec::new(),
        }
    }

    /// Issues at `Error` severity.
    pub fn errors(&self) -> impl Iterator<Item = &AttributeIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Issues at `Warning` severity.
    pub fn warnings(&self) -> impl Iterator<Item = &AttributeIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    fn push(&mut self, issue: AttributeIssue) {
        match issue.severity {
            Severity::Error => {
                log::error!("{issue}");
                self.validity = AttributeValidity::Truncated;
            }
            Severity::Warning => {
                log::warn!("{issue}");
                if self.validity == AttributeValidity::Consistent {
                    self.validity = AttributeValidity::Excess;
                }
            }
        }
        self.issues.push(issue);
    }
}

impl Default for AttributeReport {
    fn default() -> Self {
        Self::consistent()
    }
}

/// Compare every array of `attrs` against `elements`, appending to `report`.
///
/// `elements` is only evaluated if the set holds at least one array, since
/// counting elements may be expensive for some datasets.
pub fn check_attribute_sizes(
    attrs: &AttributeSet,
    elements: impl FnOnce() -> usize,
    report: &mut AttributeReport,
) {
    if attrs.is_empty() {
        return;
    }
    let elements = elements();
    for handle in attrs.iter() {
        let array = handle.read();
        let tuples = array.tuples();
        let severity = match tuples.cmp(&elements) {
            std::cmp::Ordering::Less => Severity::Error,
            std::cmp::Ordering::Greater => Severity::Warning,
            std::cmp::Ordering::Equal => continue,
        };
        report.push(AttributeIssue {
            kind: attrs.kind(),
            name: array.name().to_owned(),
            components: array.components(),
            tuples,
            elements,
            severity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::DataArray;

    #[test]
    fn worst_severity_wins_and_all_issues_are_listed() {
        let mut set = AttributeSet::new(AttributeKind::Point);
        set.add_array(DataArray::single_component("long", vec![0.0; 5]));
        set.add_array(DataArray::single_component("short", vec![0.0; 2]));
        set.add_array(DataArray::single_component("exact", vec![0.0; 4]));
        let mut report = AttributeReport::consistent();
        check_attribute_sizes(&set, || 4, &mut report);
        assert_eq!(report.validity, AttributeValidity::Truncated);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().next().map(|i| i.name.as_str()), Some("long"));
    }

    #[test]
    fn empty_set_does_not_count_elements() {
        let set = AttributeSet::new(AttributeKind::Cell);
        let mut report = AttributeReport::consistent();
        check_attribute_sizes(&set, || unreachable!(), &mut report);
        assert_eq!(report, AttributeReport::consistent());
    }
}
