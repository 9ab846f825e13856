//! Atomic JSON writes: marshal into memory, write to `path.tmp`, then
//! `rename(path.tmp, path)` (spec.md §4.11).

use std::io;
use std::path::Path;

use serde::Serialize;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    let result = std::fs::write(&tmp_path, &bytes).and_then(|()| std::fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Example {
        n: i32,
    }

    #[test]
    fn writes_and_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thing.json");
        write_json_atomic(&path, &Example { n: 7 }).unwrap();

        let loaded: Example = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(loaded, Example { n: 7 });
        assert!(!path.with_extension("json.tmp").exists());
    }
}
