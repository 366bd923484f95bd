use anyhow::Context as _;
use std::path::{Path, PathBuf};

/// Files written during one install. Unless [`Self::commit`] ran, dropping the guard removes
/// files it created and restores the previous contents of files it replaced.
#[derive(Debug, Default)]
pub struct WrittenFiles {
    entries: Vec<Written>,
    committed: bool,
}

#[derive(Debug)]
enum Written {
    Created(PathBuf),
    Replaced { path: PathBuf, previous: Vec<u8> },
}

impl Written {
    fn path(&self) -> &Path {
        match self {
            Written::Created(path) | Written::Replaced { path, .. } => path,
        }
    }

    fn roll_back(&self) -> std::io::Result<()> {
        match self {
            Written::Created(path) => std::fs::remove_file(path),
            Written::Replaced { path, previous } => std::fs::write(path, previous),
        }
    }
}

impl WrittenFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `contents` to `path`, refusing to replace an existing file unless `overwrite`.
    pub fn write(&mut self, path: &Path, contents: &str, overwrite: bool) -> anyhow::Result<()> {
        let previous = match std::fs::read(path) {
            Ok(_) if !overwrite => anyhow::bail!(
                "{} already exists (pass --force to overwrite)",
                path.display()
            ),
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let entry = match previous {
            Some(previous) => Written::Replaced {
                path: path.to_path_buf(),
                previous,
            },
            None => Written::Created(path.to_path_buf()),
        };
        // Recorded before writing so a half-written file is rolled back too.
        self.entries.push(entry);
        std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn commit(mut self) -> Vec<PathBuf> {
        self.committed = true;
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|entry| entry.path().to_path_buf())
            .collect()
    }
}

impl Drop for WrittenFiles {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for entry in self.entries.iter().rev() {
            let path = entry.path();
            match entry.roll_back() {
                Ok(()) => tracing::debug!(path = %path.display(), "Rolled back partial write"),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to roll back partial write"
                ),
            }
        }
    }
}

/// How the runtime should locate a spec stored in `env_dir`.
///
/// Inside an `environments/<env>/` tree the reference is relative
/// (`environments/<env>/<file>`) so it survives moving the config root into a container;
/// anywhere else it is the full path.
pub fn spec_reference(env_dir: &Path, file_name: &str) -> String {
    let env = env_dir.file_name();
    let parent = env_dir.parent().and_then(Path::file_name);
    match (env, parent) {
        (Some(env), Some(parent)) if parent == "environments" => {
            format!("environments/{}/{file_name}", env.to_string_lossy())
        }
        _ => env_dir.join(file_name).display().to_string(),
    }
}
