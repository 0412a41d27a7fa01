//! Diagnostic listing of the working tree, logged at the end of each run.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Directory names never descended into.
pub const IGNORED_DIRS: &[&str] = &[".git", "__pycache__", "target"];

/// Render `root` as an indented `+--name` listing.
///
/// Directories end with `/` and are listed before their contents. Entries
/// are sorted by name so the output is stable between runs.
pub fn render_tree(root: &Path, ignore: &[&str]) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let name = root
        .canonicalize()?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());
    lines.push(format!("+--{}/", name));
    walk(root, 1, ignore, &mut lines);
    Ok(lines)
}

/// List `dir` into `lines`. Unreadable directories and entries are logged and
/// skipped so one bad path does not hide the rest of the tree.
fn walk(dir: &Path, depth: usize, ignore: &[&str], lines: &mut Vec<String>) {
    let reader = match fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
            return;
        }
    };
    let mut entries: Vec<_> = reader
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!(path = %dir.display(), error = %e, "Skipping unreadable entry"))
                .ok()
        })
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let indent = " ".repeat(4 * depth);
    let (dirs, files): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false));

    for file in files {
        lines.push(format!("{}+--{}", indent, file.file_name().to_string_lossy()));
    }
    for sub in dirs {
        let name = sub.file_name().to_string_lossy().into_owned();
        if ignore.contains(&name.as_str()) {
            continue;
        }
        lines.push(format!("{}+--{}/", indent, name));
        walk(&sub.path(), depth + 1, ignore, lines);
    }
}

/// Log the tree under `root`, one line per entry.
#[instrument(level = "info", skip_all, fields(root = %root.display()))]
pub fn log_tree(root: &Path) -> io::Result<()> {
    info!("Printing tree of files/dirs");
    for line in render_tree(root, IGNORED_DIRS)? {
        info!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_tree_lists_nested_entries() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data/headlines.json"), "{}").unwrap();
        fs::write(root.join("scrape.log"), "").unwrap();

        let lines = render_tree(root, IGNORED_DIRS).unwrap();

        assert!(lines[0].starts_with("+--") && lines[0].ends_with('/'));
        assert_eq!(
            &lines[1..],
            &[
                "    +--scrape.log".to_string(),
                "    +--data/".to_string(),
                "        +--headlines.json".to_string(),
            ]
        );
    }

    #[test]
    fn test_render_tree_skips_ignored_dirs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("Cargo.toml"), "").unwrap();

        let lines = render_tree(root, IGNORED_DIRS).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "    +--Cargo.toml");
    }

    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        let dir = tempdir().unwrap();
        let mut lines = vec!["+--root/".to_string()];

        walk(&dir.path().join("vanished"), 1, IGNORED_DIRS, &mut lines);

        assert_eq!(lines, vec!["+--root/".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_locked_subdirectory_does_not_hide_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path();
        let locked = root.join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::write(root.join("z.txt"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let lines = render_tree(root, IGNORED_DIRS).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(lines.contains(&"    +--z.txt".to_string()));
        assert!(lines.contains(&"    +--locked/".to_string()));
    }

    #[test]
    fn test_render_tree_missing_root_errors() {
        let dir = tempdir().unwrap();
        assert!(render_tree(&dir.path().join("nope"), IGNORED_DIRS).is_err());
    }
}
