//! Script emission: transactional wrapping, role bracketing, durable writes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::PatchError;
use crate::constants::DROP_FILE_SUFFIX;

pub const DEFAULT_PROC_LANGUAGE: &str = "plpgsql";

/// Rules applied to every generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlRules {
    /// Role the script switches to before running its body.
    pub role: Option<String>,
    /// Procedural language of the anonymous block used for transactional scripts.
    pub proc_language: String,
}

impl Default for DdlRules {
    fn default() -> Self {
        Self {
            role: None,
            proc_language: DEFAULT_PROC_LANGUAGE.to_string(),
        }
    }
}

impl DdlRules {
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }

    /// The configured role, ignoring a blank one.
    pub fn active_role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Writes the script skeleton around `write_step`.
    ///
    /// Transactional scripts run inside one anonymous `DO` block so the body
    /// commits or rolls back as a unit. A configured role brackets the body
    /// inside that block.
    pub fn write_script<W, F>(&self, writer: &mut W, write_step: F, transactional: bool) -> io::Result<()>
    where
        W: Write + ?Sized,
        F: FnOnce(&mut W) -> io::Result<()>,
    {
        if transactional {
            writeln!(writer, "DO LANGUAGE {} $tran$", self.proc_language)?;
            writeln!(writer, "BEGIN")?;
            writeln!(writer)?;
        }

        if let Some(role) = self.active_role() {
            writeln!(writer, "SET ROLE {};", role)?;
            writeln!(writer)?;
        }

        write_step(writer)?;

        if self.active_role().is_some() {
            writeln!(writer, "RESET ROLE;")?;
            writeln!(writer)?;
        }

        if transactional {
            writeln!(writer)?;
            writeln!(writer, "END;")?;
            writeln!(writer, "$tran$;")?;
        }

        Ok(())
    }

    /// Renders a wrapped script into a string.
    pub fn render_script(&self, sql: &str, transactional: bool) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_script(&mut buffer, |w| writeln!(w, "{}", sql), transactional)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Writes `sql` wrapped by [`Self::write_script`] to `path`, replacing any
    /// existing file. Buffers are flushed and the file is synced to disk on
    /// every exit path before the handle is released.
    pub fn write_file(&self, path: &Path, sql: &str, transactional: bool) -> Result<(), PatchError> {
        let io_error = |source| PatchError::Io {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);

        let written = self.write_script(&mut writer, |w| writeln!(w, "{}", sql), transactional);
        let flushed = writer.flush();
        let synced = writer.get_ref().sync_all();

        written.and(flushed).and(synced).map_err(io_error)?;
        debug!("Wrote script {}", path.display());
        Ok(())
    }
}

/// Rollback script path that accompanies `update_file`: `<stem>.drop.<ext>`
/// in the same directory.
pub fn drop_file_name(update_file: &Path) -> PathBuf {
    let stem = update_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match update_file.extension() {
        Some(ext) => format!("{}.{}.{}", stem, DROP_FILE_SUFFIX, ext.to_string_lossy()),
        None => format!("{}.{}", stem, DROP_FILE_SUFFIX),
    };

    match update_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}
