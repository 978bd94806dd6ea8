//! Paths of the generated TypeScript files.
//!
//! `dir/file.idl` emits its top-level declarations to `dir/file.ts`, and the
//! body of `module M` to `dir/M/file.ts`. Nested modules add further
//! directories below their parent's.

use std::path::{Component, Path, PathBuf};

use itertools::Itertools;

pub const EXTENSION: &str = "ts";
pub const SOURCE_EXTENSION: &str = "idl";

/// The output file for the top-level declarations of `input`. This is
/// `input` itself if it already ends in `.ts`.
pub fn top_level(input: &Path) -> PathBuf {
    input.with_extension(EXTENSION)
}

/// The output file for a module declared in the scope that emits to `parent`.
pub fn module(parent: &Path, name: &str) -> PathBuf {
    let dir = parent.parent().unwrap_or_else(|| Path::new(""));
    match parent.file_name() {
        Some(file_name) => dir.join(name).join(file_name),
        None => dir.join(name).with_extension(EXTENSION),
    }
}

/// Lexically resolve `.` and `..` components without touching the file
/// system. Leading `..` components that cannot be resolved are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => {
                    components.push(component)
                }
            },
            component => components.push(component),
        }
    }
    components.iter().collect()
}

/// The module specifier used in `target` to import from `declared_in`, eg.
/// `./types` or `../other/types`.
pub fn import_specifier(target: &Path, declared_in: &Path) -> String {
    let from = normalize(target.parent().unwrap_or_else(|| Path::new("")));
    let to = normalize(&declared_in.with_extension(""));

    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(from, to)| from == to)
        .count();

    let ups = std::iter::repeat("..".to_owned()).take(from.len() - common);
    let downs = to[common..]
        .iter()
        .map(|component| component.as_os_str().to_string_lossy().into_owned());
    let specifier = ups.chain(downs).join("/");

    if specifier.starts_with("..") {
        specifier
    } else {
        format!("./{specifier}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_swaps_extension() {
        assert_eq!(top_level(Path::new("idl/bank.idl")), Path::new("idl/bank.ts"));
    }

    #[test]
    fn module_adds_a_directory() {
        let file = top_level(Path::new("idl/bank.idl"));
        let bank = module(&file, "Bank");
        assert_eq!(bank, Path::new("idl/Bank/bank.ts"));
        assert_eq!(module(&bank, "Accounts"), Path::new("idl/Bank/Accounts/bank.ts"));
    }

    #[test]
    fn normalize_parent_dirs() {
        assert_eq!(normalize(Path::new("a/./b/../c.idl")), Path::new("a/c.idl"));
        assert_eq!(normalize(Path::new("../a/../b")), Path::new("../b"));
    }

    #[test]
    fn import_specifiers() {
        assert_eq!(
            import_specifier(Path::new("idl/bank.ts"), Path::new("idl/Bank/bank.ts")),
            "./Bank/bank",
        );
        assert_eq!(
            import_specifier(Path::new("idl/Bank/bank.ts"), Path::new("idl/Base/base.ts")),
            "../Base/base",
        );
        assert_eq!(
            import_specifier(Path::new("idl/Bank/bank.ts"), Path::new("idl/Bank/other.ts")),
            "./other",
        );
    }
}
