//! Branch and commit of a work tree, read from `.git` directly.

use std::fs;
use std::path::{Path, PathBuf};

use astg_ir::GitInfo;

/// Git metadata of the repository containing `root`, if any.
///
/// A detached `HEAD` yields the commit with an empty branch. `.git` files
/// pointing elsewhere (worktrees, submodules) are followed.
pub fn git_info(root: &Path) -> Option<GitInfo> {
    let git_dir = find_git_dir(root)?;
    let head = fs::read_to_string(git_dir.join("HEAD")).ok()?;
    let head = head.trim();
    match head.strip_prefix("ref:") {
        Some(reference) => {
            let reference = reference.trim();
            let branch = reference
                .strip_prefix("refs/heads/")
                .unwrap_or(reference)
                .to_string();
            let commit = read_ref(&git_dir, reference).unwrap_or_default();
            Some(GitInfo { branch, commit })
        }
        None if !head.is_empty() => Some(GitInfo {
            branch: String::new(),
            commit: head.to_string(),
        }),
        None => None,
    }
}

fn find_git_dir(root: &Path) -> Option<PathBuf> {
    for dir in root.ancestors() {
        let candidate = dir.join(".git");
        if candidate.is_dir() {
            return Some(candidate);
        }
        if candidate.is_file() {
            let text = fs::read_to_string(&candidate).ok()?;
            let target = text.trim().strip_prefix("gitdir:")?.trim();
            return Some(dir.join(target));
        }
    }
    None
}

fn read_ref(git_dir: &Path, reference: &str) -> Option<String> {
    // Worktrees keep shared refs in the common directory.
    let common = fs::read_to_string(git_dir.join("commondir"))
        .ok()
        .map(|c| git_dir.join(c.trim()));
    let dirs = std::iter::once(git_dir.to_path_buf()).chain(common);
    for dir in dirs {
        if let Ok(text) = fs::read_to_string(dir.join(reference)) {
            return Some(text.trim().to_string());
        }
        if let Ok(packed) = fs::read_to_string(dir.join("packed-refs")) {
            let found = packed
                .lines()
                .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
                .filter_map(|line| line.split_once(' '))
                .find(|(_, name)| *name == reference)
                .map(|(hash, _)| hash.to_string());
            if found.is_some() {
                return found;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
        }
        fs::write(path, text).unwrap_or_else(|e| panic!("write: {e}"));
    }

    #[test]
    fn loose_ref() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main\n");
        write(dir.path(), ".git/refs/heads/main", "abc123\n");
        fs::create_dir_all(dir.path().join("sub/pkg")).unwrap_or_else(|e| panic!("{e}"));

        let info = git_info(&dir.path().join("sub/pkg"));
        assert_eq!(
            info,
            Some(GitInfo {
                branch: "main".into(),
                commit: "abc123".into()
            })
        );
    }

    #[test]
    fn packed_ref_and_detached_head() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        write(dir.path(), ".git/HEAD", "ref: refs/heads/feature/x\n");
        write(
            dir.path(),
            ".git/packed-refs",
            "# pack-refs with: peeled\ndef456 refs/heads/feature/x\n^fff refs/tags/v1\n",
        );
        let info = git_info(dir.path());
        assert_eq!(info.map(|i| (i.branch, i.commit)), Some(("feature/x".into(), "def456".into())));

        write(dir.path(), ".git/HEAD", "0123abcd\n");
        let info = git_info(dir.path());
        assert_eq!(info.map(|i| (i.branch, i.commit)), Some((String::new(), "0123abcd".into())));
    }
}
