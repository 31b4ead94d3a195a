// file: src/models/formatted_entry.rs
// description: Display formatting for retrieved entries and the combined report
// reference: tool output returned to MCP clients

use std::fmt;

pub const NO_RESULTS_MESSAGE: &str = "No relevant documents found in the knowledge base.";
pub const ENTRY_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq)]
pub enum SourceDescriptor {
    /// S3 object with a display filename and its (presigned) link.
    Linked { filename: String, link: String },
    /// S3 location that could not be linked, shown as-is.
    Raw(String),
    Absent,
}

impl SourceDescriptor {
    pub fn linked(uri: &str, link: String) -> Self {
        Self::Linked {
            filename: display_filename(uri).to_string(),
            link,
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linked { filename, link } => write!(f, "Source: [{}]({})", filename, link),
            Self::Raw(uri) => write!(f, "Source: {}", uri),
            Self::Absent => Ok(()),
        }
    }
}

/// Last path segment of a URI, or the whole string when it has none.
pub fn display_filename(uri: &str) -> &str {
    match uri.rsplit_once('/') {
        Some((_, name)) => name,
        None => uri,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattedEntry {
    /// 1-based position in backend order
    pub index: usize,
    pub score: f64,
    pub source: SourceDescriptor,
    pub content: String,
}

impl FormattedEntry {
    pub fn new(index: usize, score: f64, source: SourceDescriptor, content: String) -> Self {
        Self {
            index,
            score,
            source,
            content,
        }
    }
}

impl fmt::Display for FormattedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] (Score: {:.3}) {}\n{}",
            self.index, self.score, self.source, self.content
        )
    }
}

/// All entries for one query, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalReport {
    pub entries: Vec<FormattedEntry>,
}

impl RetrievalReport {
    pub fn new(entries: Vec<FormattedEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for RetrievalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str(NO_RESULTS_MESSAGE);
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(ENTRY_SEPARATOR)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_linked_entry_format() {
        let entry = FormattedEntry::new(
            1,
            0.8234,
            SourceDescriptor::linked(
                "s3://my-bucket/docs/report.pdf",
                "https://example.com/signed".to_string(),
            ),
            "Quarterly revenue grew.".to_string(),
        );

        assert_eq!(
            entry.to_string(),
            "[1] (Score: 0.823) Source: [report.pdf](https://example.com/signed)\nQuarterly revenue grew."
        );
    }

    #[test]
    fn test_entry_without_source() {
        let entry = FormattedEntry::new(2, 0.0, SourceDescriptor::Absent, "body".to_string());
        assert_eq!(entry.to_string(), "[2] (Score: 0.000) \nbody");
    }

    #[test]
    fn test_raw_source() {
        let entry = FormattedEntry::new(
            3,
            1.0,
            SourceDescriptor::Raw("Unknown".to_string()),
            String::new(),
        );
        assert_eq!(entry.to_string(), "[3] (Score: 1.000) Source: Unknown\n");
    }

    #[test]
    fn test_display_filename() {
        assert_eq!(display_filename("s3://my-bucket/docs/report.pdf"), "report.pdf");
        assert_eq!(display_filename("no-slashes"), "no-slashes");
        assert_eq!(display_filename("s3://bucket/dir/"), "");
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(
            RetrievalReport::default().to_string(),
            "No relevant documents found in the knowledge base."
        );
    }

    #[test]
    fn test_report_joins_entries() {
        let report = RetrievalReport::new(vec![
            FormattedEntry::new(1, 0.9, SourceDescriptor::Absent, "a".to_string()),
            FormattedEntry::new(2, 0.5, SourceDescriptor::Absent, "b".to_string()),
        ]);

        assert_eq!(report.len(), 2);
        assert_eq!(
            report.to_string(),
            "[1] (Score: 0.900) \na\n\n---\n\n[2] (Score: 0.500) \nb"
        );
    }
}
