use std::fs;
use std::path::{Path, PathBuf};

use rand::{thread_rng, Rng};
use tempfile::TempDir;

use crate::error::{C3poError, C3poResult};

/// A directory tree built next to `target` and swapped in only once complete.
///
/// Dropping a `StagedTree` without calling [`StagedTree::commit`] deletes the
/// staged files and leaves `target` untouched.
pub struct StagedTree {
    dir: TempDir,
    target: PathBuf,
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("tree")
        .to_string()
}

impl StagedTree {
    pub fn new(target: &Path) -> C3poResult<Self> {
        let parent = parent_of(target);
        fs::create_dir_all(&parent).map_err(|e| C3poError::io(&parent, e))?;

        let dir = tempfile::Builder::new()
            .prefix(&format!(".{}.staging-", base_name(target)))
            .tempdir_in(&parent)
            .map_err(|e| C3poError::io(&parent, e))?;

        Ok(StagedTree {
            dir,
            target: target.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Replaces `target` with the staged tree.
    ///
    /// The old tree is moved aside first and restored if the swap fails, so
    /// `target` is always either the old tree or the complete new one.
    pub fn commit(self) -> C3poResult<()> {
        let target = &self.target;
        let backup = if target.exists() {
            let backup = parent_of(target).join(format!(
                ".{}.previous-{:08x}",
                base_name(target),
                thread_rng().gen::<u32>()
            ));
            fs::rename(target, &backup).map_err(|e| C3poError::io(target, e))?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(self.dir.path(), target) {
            if let Some(backup) = &backup {
                if let Err(restore) = fs::rename(backup, target) {
                    tracing::error!(
                        backup = %backup.display(),
                        error = %restore,
                        "failed to restore previous tree"
                    );
                }
            }
            return Err(C3poError::io(target, e));
        }

        if let Some(backup) = backup {
            if let Err(e) = fs::remove_dir_all(&backup) {
                tracing::warn!(backup = %backup.display(), error = %e, "failed to remove previous tree");
            }
        }

        tracing::debug!(target = %target.display(), "staged tree swapped in");
        Ok(())
    }
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> C3poResult<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        fs::create_dir_all(parent).map_err(|e| C3poError::io(parent, e))?;
    }

    fs::write(&tmp, bytes).map_err(|e| C3poError::io(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(C3poError::io(path, e));
    }

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "c3po".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_replaces_existing_tree() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("locale");
        fs::create_dir_all(target.join("en")).unwrap();
        fs::write(target.join("en").join("old.po"), "old").unwrap();

        let staged = StagedTree::new(&target).unwrap();
        fs::create_dir_all(staged.path().join("fr")).unwrap();
        fs::write(staged.path().join("fr").join("new.po"), "new").unwrap();
        staged.commit().unwrap();

        assert!(!target.join("en").exists());
        assert_eq!(fs::read_to_string(target.join("fr").join("new.po")).unwrap(), "new");

        let leftovers: Vec<_> = fs::read_dir(root.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn dropped_stage_leaves_target_alone() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("locale");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.po"), "keep").unwrap();

        {
            let staged = StagedTree::new(&target).unwrap();
            fs::write(staged.path().join("half.po"), "half").unwrap();
        }

        assert!(target.join("keep.po").exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!dir.path().join("settings.json.tmp").exists());
    }
}
