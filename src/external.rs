use std::io::{ErrorKind, Write};
use std::process::{Child, Command, Stdio};

use crate::{blog_debug, blog_warn, Error, Result};

/// Source of job bodies for `put`.
pub trait Composer {
    fn compose(&self) -> Result<Vec<u8>>;
}

/// Opens the operator's editor on an empty temp file and returns whatever
/// was saved.
pub struct ExternalEditor {
    command: Vec<String>,
}

impl ExternalEditor {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Composer for ExternalEditor {
    fn compose(&self) -> Result<Vec<u8>> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::Editor("no editor configured".to_string()))?;
        let binary = which::which(program)
            .map_err(|_| Error::Editor(format!("editor '{}' not found in PATH", program)))?;

        let file = tempfile::Builder::new()
            .prefix("beany")
            .suffix(".txt")
            .tempfile()?;
        blog_debug!(
            "ExternalEditor::compose {} {:?} {}",
            binary.display(),
            args,
            file.path().display()
        );

        let status = Command::new(&binary).args(args).arg(file.path()).status()?;
        if !status.success() {
            blog_warn!("Editor exited with {}", status);
            return Err(Error::Editor(format!("'{}' exited with {}", program, status)));
        }

        Ok(std::fs::read(file.path())?)
    }
}

/// Start the pager with a piped stdin. Failing here means nothing was
/// shown, so callers may fall back to printing inline.
pub fn spawn_pager(command: &[String]) -> Result<Child> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Pager("no pager configured".to_string()))?;
    blog_debug!("spawn_pager {} {:?}", program, args);

    Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Pager(format!("failed to start '{}': {}", program, e)))
}

/// Write `text` into a started pager and wait for the operator to quit it.
/// The child is always reaped, whatever happened to the write.
pub fn feed_pager(mut child: Child, text: &str) -> Result<()> {
    blog_debug!("feed_pager pid={} ({} bytes)", child.id(), text.len());
    let written = match child.stdin.take() {
        // Dropping stdin at the end of the arm sends EOF
        Some(mut stdin) => match stdin.write_all(text.as_bytes()) {
            // The pager closing early (operator pressed q) is not an error
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            other => other,
        },
        None => Ok(()),
    };

    let status = child.wait()?;
    written?;
    if !status.success() {
        blog_warn!("Pager exited with {}", status);
        return Err(Error::Pager(format!("pager exited with {}", status)));
    }
    Ok(())
}
