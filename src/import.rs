//! Parser for the OnBase disk-dump text format.
//!
//! A dump looks like:
//!
//! ```text
//! <header line>
//! BEGIN:
//! >DocTypeName: Invoice
//! >Document Handle: 1042
//! >FileName: VOL1\0001\1042.tif
//! BEGIN:
//! ...
//! END:
//! ```
//!
//! Each `BEGIN:` section becomes one [`Document`]. Repeated document handles are
//! renamed (`1042`, `1042_2`, `1042_3`, ...) so every handle in the result is unique.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::schema::{AttributeKind, AttributeSchema};

pub const BEGIN_MARKER: &str = "BEGIN:";
pub const END_MARKER: &str = "END:";

/// What to do with an attribute that is in neither schema set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Abort the whole import.
    #[default]
    Strict,
    /// Log a warning and drop the value.
    Lenient,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("dump contains no `{BEGIN_MARKER}` marker")]
    MissingBeginMarker,

    #[error("invalid attribute '{attribute}' in section {section}, line {line}")]
    UnknownAttribute {
        attribute: String,
        section: usize,
        line: usize,
    },
}

pub struct DumpParser<'a> {
    schema: &'a AttributeSchema,
    policy: SchemaPolicy,
}

impl<'a> DumpParser<'a> {
    pub fn new(schema: &'a AttributeSchema, policy: SchemaPolicy) -> Self {
        Self { schema, policy }
    }

    /// Parses a whole dump. Under [`SchemaPolicy::Strict`] an unknown attribute
    /// fails the call and no documents are returned.
    pub fn parse(&self, raw: &str) -> Result<Vec<Document>, ImportError> {
        info!(bytes = raw.len(), policy = ?self.policy, "Importing data from dump");

        let (_, body) = raw
            .split_once(BEGIN_MARKER)
            .ok_or(ImportError::MissingBeginMarker)?;
        let body = body.split_once(END_MARKER).map_or(body, |(kept, _)| kept);

        let mut handles = HandleDeduplicator::default();
        let mut documents = Vec::new();

        for (index, section) in body.split(BEGIN_MARKER).enumerate() {
            if section.is_empty() {
                continue;
            }
            let mut doc = self.parse_section(index + 1, section)?;
            doc.document_handle = handles.claim(doc.document_handle.take());
            documents.push(doc);
        }

        info!(documents = documents.len(), "Data imported");
        Ok(documents)
    }

    fn parse_section(&self, section: usize, text: &str) -> Result<Document, ImportError> {
        let mut doc = Document::default();

        for (offset, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (attribute, value) = split_attribute_line(line);

            match self.schema.classify(attribute) {
                AttributeKind::FileName => {
                    if !doc.add_file(value) {
                        debug!(section, file = value, "Skipping repeated FileName");
                    }
                }
                AttributeKind::Document(attr) => doc.set_attribute(attr, value),
                AttributeKind::File => {}
                AttributeKind::Unknown => match self.policy {
                    SchemaPolicy::Strict => {
                        return Err(ImportError::UnknownAttribute {
                            attribute: attribute.to_string(),
                            section,
                            line: offset + 1,
                        });
                    }
                    SchemaPolicy::Lenient => warn!(
                        attribute,
                        value,
                        section,
                        line = offset + 1,
                        "Discarding unknown attribute"
                    ),
                },
            }
        }

        Ok(doc)
    }
}

/// Parses `raw` with the given schema and policy.
pub fn parse(
    raw: &str,
    schema: &AttributeSchema,
    policy: SchemaPolicy,
) -> Result<Vec<Document>, ImportError> {
    DumpParser::new(schema, policy).parse(raw)
}

/// Splits `>Attribute: value` on the first colon. A line without a colon is
/// all attribute and no value.
fn split_attribute_line(line: &str) -> (&str, &str) {
    let (attribute, value) = line.split_once(':').unwrap_or((line, ""));
    let attribute = attribute.trim().trim_start_matches('>').trim();
    (attribute, value.trim())
}

/// Tracks handles already handed out during one parse.
#[derive(Debug, Default)]
struct HandleDeduplicator {
    seen: HashSet<String>,
}

impl HandleDeduplicator {
    /// Returns the effective handle for a record. An absent handle is keyed as
    /// the empty string, so a second absent handle comes back as `_2`.
    fn claim(&mut self, handle: Option<String>) -> Option<String> {
        let key = handle.clone().unwrap_or_default();
        if self.seen.insert(key.clone()) {
            return handle;
        }

        let mut suffix = 2;
        let renamed = loop {
            let candidate = format!("{key}_{suffix}");
            if !self.seen.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        info!(original = %key, renamed = %renamed, "Renamed duplicate document handle");
        self.seen.insert(renamed.clone());
        Some(renamed)
    }
}
