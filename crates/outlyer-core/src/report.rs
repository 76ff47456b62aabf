//! Per-resource outcomes and the final report table.

use std::fmt;

use crate::resource::ResourceRef;

/// Where a record ended up. Set once, after its remote or disk call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Created,
    Updated,
    Written,
    Failed(String),
}

impl Outcome {
    /// STATUS column text
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Pending => "PENDING",
            Outcome::Created => "OK [CREATED]",
            Outcome::Updated => "OK [UPDATED]",
            Outcome::Written => "OK [WRITTEN]",
            Outcome::Failed(_) => "FAIL",
        }
    }

    /// REASON column text
    pub fn reason(&self) -> &str {
        match self {
            Outcome::Failed(reason) => reason,
            _ => "",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::Updated | Outcome::Written)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(reason) => write!(f, "FAIL: {reason}"),
            other => f.write_str(other.status()),
        }
    }
}

/// One resource moving through apply or export.
///
/// For apply `source_path` is the local file read; for export it is the
/// file written, or the selector when the fetch itself failed.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    /// `None` until the path or document has been classified
    pub reference: Option<ResourceRef>,
    pub source_path: String,
    pub raw_bytes: Vec<u8>,
    pub wire_bytes: Vec<u8>,
    pub outcome: Outcome,
}

impl ResourceRecord {
    pub fn pending(source_path: &str) -> Self {
        ResourceRecord {
            reference: None,
            source_path: source_path.to_string(),
            raw_bytes: Vec::new(),
            wire_bytes: Vec::new(),
            outcome: Outcome::Pending,
        }
    }

    /// A record that failed before it could be classified.
    pub fn failed(source_path: &str, reason: impl fmt::Display) -> Self {
        ResourceRecord::pending(source_path).settle(Outcome::Failed(reason.to_string()))
    }

    /// Set the terminal outcome. A settled record keeps its first outcome.
    pub fn settle(mut self, outcome: Outcome) -> Self {
        if self.outcome == Outcome::Pending {
            self.outcome = outcome;
        }
        self
    }

    /// RESOURCE column: `kind/name.ext`, or the source path when unclassified
    pub fn resource(&self) -> String {
        match &self.reference {
            Some(reference) => reference.identity_with_extension(),
            None => self.source_path.clone(),
        }
    }
}

/// Aggregated result of one apply or export run.
#[derive(Debug, Clone)]
pub struct Report {
    pub account: String,
    pub records: Vec<ResourceRecord>,
}

impl Report {
    /// Rows are sorted by resource, then source path, so the table does not
    /// depend on task completion order.
    pub fn new(account: &str, mut records: Vec<ResourceRecord>) -> Self {
        records.sort_by(|a, b| {
            a.resource()
                .cmp(&b.resource())
                .then_with(|| a.source_path.cmp(&b.source_path))
        });
        Report {
            account: account.to_string(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.outcome.is_success())
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }

    /// 0 when every record succeeded, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    /// Render the `ACCOUNT RESOURCE STATUS REASON` table.
    pub fn render(&self) -> String {
        let mut out = row("ACCOUNT", "RESOURCE", "STATUS", "REASON");
        for record in &self.records {
            out.push_str(&row(
                &self.account,
                &record.resource(),
                record.outcome.status(),
                record.outcome.reason(),
            ));
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn row(account: &str, resource: &str, status: &str, reason: &str) -> String {
    format!("{account:<20}\t{resource:<40}\t{status:<20}\t{reason:<25}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, outcome: Outcome) -> ResourceRecord {
        let mut record = ResourceRecord::pending(path);
        record.reference = ResourceRef::from_path(path).ok();
        record.settle(outcome)
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Updated.status(), "OK [UPDATED]");
        assert_eq!(Outcome::Created.status(), "OK [CREATED]");
        assert_eq!(Outcome::Written.status(), "OK [WRITTEN]");
        assert_eq!(Outcome::Failed("boom".into()).status(), "FAIL");
        assert_eq!(Outcome::Failed("boom".into()).reason(), "boom");
        assert!(!Outcome::Pending.is_success());
    }

    #[test]
    fn test_outcome_set_once() {
        let r = ResourceRecord::pending("alerts/a.yaml")
            .settle(Outcome::Updated)
            .settle(Outcome::Failed("late".into()));
        assert_eq!(r.outcome, Outcome::Updated);
    }

    #[test]
    fn test_rows_sorted_by_resource() {
        let report = Report::new(
            "acme",
            vec![
                record("x/plugins/docker.py", Outcome::Created),
                record("x/alerts/docker.yaml", Outcome::Updated),
                record("x/checks/docker.yaml", Outcome::Updated),
            ],
        );
        let resources: Vec<String> = report.records.iter().map(|r| r.resource()).collect();
        assert_eq!(
            resources,
            vec!["alerts/docker.yaml", "checks/docker.yaml", "plugins/docker.py"]
        );
        assert!(report.all_succeeded());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_render() {
        let report = Report::new(
            "acme",
            vec![
                record("alerts/docker.yaml", Outcome::Updated),
                ResourceRecord::failed("nope/thing.yaml", "no resource kind"),
            ],
        );
        let text = report.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ACCOUNT"));
        assert!(lines[1].contains("alerts/docker.yaml"));
        assert!(lines[1].contains("OK [UPDATED]"));
        assert!(lines[2].contains("nope/thing.yaml"));
        assert!(lines[2].contains("FAIL"));
        assert!(lines[2].contains("no resource kind"));
        assert_eq!(report.failures(), 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_column_widths() {
        let line = row("acme", "alerts/a.yaml", "OK [UPDATED]", "");
        let columns: Vec<&str> = line.trim_end_matches('\n').split('\t').collect();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].len(), 20);
        assert_eq!(columns[1].len(), 40);
        assert_eq!(columns[2].len(), 20);
    }
}
