//! Operator-supplied document details and the console prompts that collect them.
//!
//! The ingestor never talks to the terminal directly. It asks an
//! [`AnnotationSource`] for a [`DocumentAnnotations`] record once the PDF has
//! been opened. [`ConsolePrompter`] asks the four questions on a terminal;
//! a literal `DocumentAnnotations` is itself a source, which is how tests and
//! non-interactive callers drive an ingestion.

use std::io::{self, BufRead, Write};

/// Version stored when the operator leaves the version prompt empty.
pub const DEFAULT_VERSION: &str = "1.0";

pub const AUTHOR_PROMPT: &str = "Enter document author: ";
pub const TITLE_PROMPT: &str = "Enter document title: ";
pub const DESCRIPTION_PROMPT: &str = "Enter document description: ";
pub const VERSION_PROMPT: &str = "Enter document version (press Enter for default 1.0): ";

/// Details about a document that only the operator knows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentAnnotations {
    pub author: String,
    pub title: String,
    pub description: String,
    pub version: String,
}

impl DocumentAnnotations {
    /// Build a record, substituting [`DEFAULT_VERSION`] for an empty version.
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            description: description.into(),
            version: resolve_version(version.into()),
        }
    }
}

/// Empty input means "use the default"; anything else is kept verbatim,
/// whitespace included.
pub fn resolve_version(raw: String) -> String {
    if raw.is_empty() {
        DEFAULT_VERSION.to_string()
    } else {
        raw
    }
}

/// Anything that can produce the operator's annotations on demand.
pub trait AnnotationSource {
    fn collect(&mut self) -> io::Result<DocumentAnnotations>;
}

impl AnnotationSource for DocumentAnnotations {
    fn collect(&mut self) -> io::Result<DocumentAnnotations> {
        Ok(DocumentAnnotations {
            version: resolve_version(self.version.clone()),
            ..self.clone()
        })
    }
}

/// Line-oriented prompts over any reader/writer pair.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one line without its line terminator.
    ///
    /// Returns `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    /// Like [`ask`](Self::ask) but treats end of input as an error.
    fn require(&mut self, prompt: &str) -> io::Result<String> {
        self.ask(prompt)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before all document details were entered",
            )
        })
    }

    /// Writer the prompts go to.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }
}

impl<R: BufRead, W: Write> AnnotationSource for ConsolePrompter<R, W> {
    fn collect(&mut self) -> io::Result<DocumentAnnotations> {
        let author = self.require(AUTHOR_PROMPT)?;
        let title = self.require(TITLE_PROMPT)?;
        let description = self.require(DESCRIPTION_PROMPT)?;
        let version = self.require(VERSION_PROMPT)?;
        Ok(DocumentAnnotations::new(author, title, description, version))
    }
}
