// crates/opc2aml-rs/src/report.rs

//! The conversion report: every defect of one run, accumulated in order of
//! discovery, so a single pass over a large input surfaces all problems at
//! once instead of failing on the first.

use std::fmt;

/// How an issue affects the operation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged, degraded output produced, conversion continues.
    Recoverable,
    /// The operation it affects must fail.
    Fatal,
}

/// Discriminant of an [`Issue`], for per-kind counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    MalformedIdentifier,
    UnresolvedReference,
    UnsupportedDataType,
    DuplicateIdentifier,
    MissingPrerequisiteNamespace,
    OrphanNode,
    RawGuidIdentifier,
    MixedPayloadRole,
}

/// One defect found while converting or merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A source node id could not be parsed; the node was skipped.
    MalformedIdentifier { raw_id: String, reason: String },

    /// A reference points at a node outside the working set.
    UnresolvedReference {
        source: String,
        reference_type: String,
        target: String,
    },

    /// A value payload whose type is unknown or beyond the encoder's reach;
    /// a degraded string encoding was produced.
    UnsupportedDataType { node: String, detail: String },

    /// An output identifier occurs more than once in the finished document.
    DuplicateIdentifier { id: String, count: usize },

    /// An insert prerequisite is neither in the target document nor in the
    /// requested set.
    MissingPrerequisiteNamespace {
        namespace: String,
        prerequisite: String,
    },

    /// An instance node reachable by no hierarchical reference and owning
    /// nothing; excluded from the output.
    OrphanNode { node: String },

    /// An output identifier that collapses to bare GUID syntax instead of a
    /// codec product.
    RawGuidIdentifier { id: String },

    /// A `Definition`-role subtree nested under an `Instance`-role identity
    /// attribute, or the reverse.
    MixedPayloadRole { id: String, detail: String },
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Issue::MalformedIdentifier { .. } => IssueKind::MalformedIdentifier,
            Issue::UnresolvedReference { .. } => IssueKind::UnresolvedReference,
            Issue::UnsupportedDataType { .. } => IssueKind::UnsupportedDataType,
            Issue::DuplicateIdentifier { .. } => IssueKind::DuplicateIdentifier,
            Issue::MissingPrerequisiteNamespace { .. } => IssueKind::MissingPrerequisiteNamespace,
            Issue::OrphanNode { .. } => IssueKind::OrphanNode,
            Issue::RawGuidIdentifier { .. } => IssueKind::RawGuidIdentifier,
            Issue::MixedPayloadRole { .. } => IssueKind::MixedPayloadRole,
        }
    }

    /// Duplicate ids and missing prerequisites sink the operation; everything
    /// else degrades locally.
    pub fn severity(&self) -> Severity {
        match self {
            Issue::DuplicateIdentifier { .. } | Issue::MissingPrerequisiteNamespace { .. } => {
                Severity::Fatal
            }
            _ => Severity::Recoverable,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MalformedIdentifier { raw_id, reason } => {
                write!(f, "Malformed node identifier '{}': {}", raw_id, reason)
            }
            Issue::UnresolvedReference {
                source,
                reference_type,
                target,
            } => write!(
                f,
                "Unresolved {} reference from {} to {}",
                reference_type, source, target
            ),
            Issue::UnsupportedDataType { node, detail } => {
                write!(f, "Unsupported data type at {}: {}", node, detail)
            }
            Issue::DuplicateIdentifier { id, count } => {
                write!(f, "Identifier '{}' occurs {} times", id, count)
            }
            Issue::MissingPrerequisiteNamespace {
                namespace,
                prerequisite,
            } => write!(
                f,
                "Namespace {} requires {} which is neither inserted nor requested",
                namespace, prerequisite
            ),
            Issue::OrphanNode { node } => write!(f, "Orphan node {} excluded from output", node),
            Issue::RawGuidIdentifier { id } => {
                write!(f, "Identifier '{}' is a bare GUID, not a codec product", id)
            }
            Issue::MixedPayloadRole { id, detail } => {
                write!(f, "Mixed payload roles under '{}': {}", id, detail)
            }
        }
    }
}

/// All issues of one conversion or merge, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    issues: Vec<Issue>,
}

impl ConversionReport {
    pub fn new() -> Self {
        ConversionReport { issues: Vec::new() }
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// True when nothing at all was recorded; the caller's zero-exit case.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Fatal)
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind() == kind).count()
    }

    /// Folds the other report's issues into this one, keeping their order.
    pub fn absorb(&mut self, other: ConversionReport) {
        self.issues.extend(other.issues);
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "clean");
        }
        writeln!(f, "{} issue(s):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  - {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_split() {
        let fatal = Issue::DuplicateIdentifier {
            id: "x".to_string(),
            count: 2,
        };
        assert_eq!(fatal.severity(), Severity::Fatal);

        let recoverable = Issue::OrphanNode {
            node: "ns=1;i=9".to_string(),
        };
        assert_eq!(recoverable.severity(), Severity::Recoverable);
    }

    #[test]
    fn test_report_accumulates_and_counts() {
        let mut report = ConversionReport::new();
        assert!(report.is_clean());
        assert!(!report.has_fatal());

        report.push(Issue::OrphanNode {
            node: "ns=1;i=9".to_string(),
        });
        report.push(Issue::OrphanNode {
            node: "ns=1;i=10".to_string(),
        });
        report.push(Issue::DuplicateIdentifier {
            id: "dup".to_string(),
            count: 3,
        });

        assert!(!report.is_clean());
        assert!(report.has_fatal());
        assert_eq!(report.count_of(IssueKind::OrphanNode), 2);
        assert_eq!(report.count_of(IssueKind::DuplicateIdentifier), 1);
        assert_eq!(report.count_of(IssueKind::MalformedIdentifier), 0);
    }

    #[test]
    fn test_display_messages() {
        let issue = Issue::DuplicateIdentifier {
            id: "abc".to_string(),
            count: 2,
        };
        assert_eq!(issue.to_string(), "Identifier 'abc' occurs 2 times");

        let issue = Issue::MissingPrerequisiteNamespace {
            namespace: "http://a/".to_string(),
            prerequisite: "http://b/".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "Namespace http://a/ requires http://b/ which is neither inserted nor requested"
        );
    }
}
