use anyhow::{Context, Result};
use log::debug;
use std::{
    fs,
    io::{Cursor, Write},
    path::Path,
};
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::utils::{relative_object_name, walk_files};

/// Zip archive assembled in memory.
pub struct ArchiveWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    pub fn write_bytes(&mut self, name: &str, content: &[u8]) -> Result<()> {
        self.writer
            .start_file(name, SimpleFileOptions::default())
            .with_context(|| format!("Could not add `{name}` to archive"))?;
        self.writer.write_all(content).map_err(anyhow::Error::msg)
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self
            .writer
            .finish()
            .context("Could not finish archive")?
            .into_inner())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Zip every regular file below `root`, named by its path relative to `root`.
pub fn zip_directory(root: &Path) -> Result<Vec<u8>> {
    let mut archive = ArchiveWriter::new();
    for file in walk_files(root)? {
        let name = relative_object_name(root, &file)?;
        let content =
            fs::read(&file).with_context(|| format!("Could not read `{}`", file.display()))?;
        debug!("Adding `{}` ({} bytes) to archive", name, content.len());
        archive.write_bytes(&name, &content)?;
    }
    archive.finish()
}
