use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// All regular files below `root`, recursively, in a stable order.
///
/// Directories themselves are not returned.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_into(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_into(directory: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("Could not read directory `{}`", directory.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("Could not read entry in `{}`", directory.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Could not stat `{}`", path.display()))?;

        if file_type.is_dir() {
            walk_into(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Path of `file` relative to `root`, with `/` separators, as used in object names.
pub fn relative_object_name(root: &Path, file: &Path) -> Result<String> {
    let relative = file.strip_prefix(root).map_err(|_| {
        anyhow!(
            "File `{}` is not inside `{}`",
            file.display(),
            root.display()
        )
    })?;

    relative
        .components()
        .map(|component| {
            component.as_os_str().to_str().ok_or_else(|| {
                anyhow!("File name `{}` is not valid UTF-8", file.display())
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(|segments| segments.join("/"))
}
