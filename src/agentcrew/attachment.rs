//! Files attached to a question.
//!
//! Uploads are classified by extension and declared MIME type. JSON and CSV are decoded
//! here into a plain-text rendering that can be handed to the first task through
//! [`RunRequest::with_reference_data`](crate::pipeline::RunRequest::with_reference_data).
//! Spreadsheets and PDFs need a [`DocumentReader`] supplied by the host.
//!
//! Attachment problems never abort a run: [`collect_reference_data`] turns them into
//! warnings and carries on with whatever could be read.

use std::error::Error;
use std::fmt;
use std::path::Path;

/// Longest reference text handed to a pipeline, in characters.
pub const MAX_REFERENCE_CHARS: usize = 12_000;
/// Rows of a CSV file reproduced in the rendering.
const CSV_PREVIEW_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Json,
    Csv,
    Xlsx,
    Pdf,
}

impl AttachmentKind {
    /// Classify an upload. The extension is checked first, then the MIME type.
    pub fn detect(file_name: &str, mime: Option<&str>) -> Result<Self, AttachmentError> {
        let by_extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .and_then(|e| match e.as_str() {
                "json" => Some(AttachmentKind::Json),
                "csv" => Some(AttachmentKind::Csv),
                "xlsx" => Some(AttachmentKind::Xlsx),
                "pdf" => Some(AttachmentKind::Pdf),
                _ => None,
            });

        let by_mime = || {
            let essence = mime?.split(';').next()?.trim().to_ascii_lowercase();
            match essence.as_str() {
                "application/json" | "text/json" => Some(AttachmentKind::Json),
                "text/csv" | "application/csv" => Some(AttachmentKind::Csv),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                    Some(AttachmentKind::Xlsx)
                }
                "application/pdf" => Some(AttachmentKind::Pdf),
                _ => None,
            }
        };

        by_extension
            .or_else(by_mime)
            .ok_or_else(|| AttachmentError::UnsupportedFileType {
                file_name: file_name.to_string(),
                mime: mime.map(str::to_string),
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Json => "JSON",
            AttachmentKind::Csv => "CSV",
            AttachmentKind::Xlsx => "XLSX",
            AttachmentKind::Pdf => "PDF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    UnsupportedFileType {
        file_name: String,
        mime: Option<String>,
    },
    Parse { file_name: String, message: String },
    /// No [`DocumentReader`] was configured for this kind of file.
    ReaderUnavailable {
        file_name: String,
        kind: AttachmentKind,
    },
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::UnsupportedFileType { file_name, mime } => match mime {
                Some(mime) => write!(f, "Unsupported file type for '{}' ({})", file_name, mime),
                None => write!(f, "Unsupported file type for '{}'", file_name),
            },
            AttachmentError::Parse { file_name, message } => {
                write!(f, "Could not read '{}': {}", file_name, message)
            }
            AttachmentError::ReaderUnavailable { file_name, kind } => write!(
                f,
                "No reader configured for {} files ('{}')",
                kind.as_str(),
                file_name
            ),
        }
    }
}

impl Error for AttachmentError {}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    kind: AttachmentKind,
    bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, AttachmentError> {
        let file_name = file_name.into();
        let kind = AttachmentKind::detect(&file_name, mime)?;
        Ok(Self {
            file_name,
            kind,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Plain-text rendering of the file.
    pub fn to_reference_text(
        &self,
        reader: Option<&dyn DocumentReader>,
    ) -> Result<String, AttachmentError> {
        match self.kind {
            AttachmentKind::Json => self.render_json(),
            AttachmentKind::Csv => self.render_csv(),
            AttachmentKind::Xlsx | AttachmentKind::Pdf => match reader {
                Some(reader) => reader.read(self),
                None => Err(AttachmentError::ReaderUnavailable {
                    file_name: self.file_name.clone(),
                    kind: self.kind,
                }),
            },
        }
    }

    fn parse_error(&self, message: impl fmt::Display) -> AttachmentError {
        AttachmentError::Parse {
            file_name: self.file_name.clone(),
            message: message.to_string(),
        }
    }

    fn text(&self) -> Result<&str, AttachmentError> {
        let text = std::str::from_utf8(&self.bytes).map_err(|e| self.parse_error(e))?;
        Ok(text.trim_start_matches('\u{feff}'))
    }

    fn render_json(&self) -> Result<String, AttachmentError> {
        let value: serde_json::Value =
            serde_json::from_str(self.text()?).map_err(|e| self.parse_error(e))?;
        serde_json::to_string_pretty(&value).map_err(|e| self.parse_error(e))
    }

    fn render_csv(&self) -> Result<String, AttachmentError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(self.text()?.as_bytes());
        let header = reader.headers().map_err(|e| self.parse_error(e))?.clone();
        if header.is_empty() {
            return Err(self.parse_error("file is empty"));
        }

        let mut rendered = format!("columns: {}\n", join_record(&header));
        let mut rows = 0usize;
        for record in reader.records() {
            let record = record.map_err(|e| self.parse_error(e))?;
            if rows < CSV_PREVIEW_ROWS {
                rendered.push_str(&join_record(&record));
                rendered.push('\n');
            }
            rows += 1;
        }
        if rows > CSV_PREVIEW_ROWS {
            rendered.push_str(&format!("... ({} more rows)\n", rows - CSV_PREVIEW_ROWS));
        }
        rendered.push_str(&format!("rows: {}", rows));
        Ok(rendered)
    }
}

/// One record per line: embedded line breaks are folded into spaces.
fn join_record(record: &csv::StringRecord) -> String {
    record
        .iter()
        .map(|field| field.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Turns formats this crate does not decode (XLSX, PDF) into text.
pub trait DocumentReader: Send + Sync {
    fn read(&self, attachment: &Attachment) -> Result<String, AttachmentError>;
}

/// Render every attachment and join them into one reference block.
///
/// Failures are logged and pushed onto `warnings`; the remaining files are still used.
/// Returns `None` when nothing could be read.
pub fn collect_reference_data(
    attachments: &[Attachment],
    reader: Option<&dyn DocumentReader>,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let mut sections = Vec::new();
    for attachment in attachments {
        match attachment.to_reference_text(reader) {
            Ok(text) => sections.push(format!(
                "### {} ({})\n{}",
                attachment.file_name(),
                attachment.kind().as_str(),
                text
            )),
            Err(err) => {
                log::warn!("collect_reference_data(): {}", err);
                warnings.push(err.to_string());
            }
        }
    }
    if sections.is_empty() {
        return None;
    }

    let joined = sections.join("\n\n");
    if joined.chars().count() > MAX_REFERENCE_CHARS {
        warnings.push(format!(
            "Attached data was truncated to {} characters.",
            MAX_REFERENCE_CHARS
        ));
        return Some(joined.chars().take(MAX_REFERENCE_CHARS).collect());
    }
    Some(joined)
}
