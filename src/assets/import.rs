//! Import resolution: under which name is the marker package visible?

use tracing::{debug, warn};

use super::MarkerAlias;
use crate::syntax::ast::{ImportName, SourceFile};

/// Finds the marker import and returns its alias, or `None` when the file
/// does not import `import_path`.
///
/// A second import of the same path is not an error; the last one wins.
pub fn resolve_alias(file: &SourceFile, import_path: &str) -> Option<MarkerAlias> {
    let mut alias = None;

    for spec in file.imports() {
        if spec.value.path.string_value().as_deref() != Some(import_path) {
            continue;
        }
        let resolved = match &spec.value.name {
            Some(ImportName::Named(name)) if name.value == "_" => MarkerAlias::Unqualified,
            Some(ImportName::Named(name)) => MarkerAlias::Named(name.value.clone()),
            Some(ImportName::Dot) => MarkerAlias::Unqualified,
            None => MarkerAlias::Named(default_package_name(import_path).to_string()),
        };
        if alias.is_some() {
            warn!(path = import_path, "marker package imported more than once; using the last import");
        }
        debug!(path = import_path, alias = ?resolved, "found marker import");
        alias = Some(resolved);
    }
    alias
}

/// The name an unrenamed import binds: the last path element, skipping a
/// major version suffix such as `/v2`.
pub fn default_package_name(import_path: &str) -> &str {
    let mut segments = import_path.rsplit('/');
    let last = segments.next().unwrap_or(import_path);
    let is_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].bytes().all(|b| b.is_ascii_digit());
    match segments.next() {
        Some(parent) if is_version => parent,
        _ => last,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MARKER_IMPORT_PATH;
    use crate::errors::SourceContext;
    use crate::syntax::parse;

    fn resolve(text: &str) -> Option<MarkerAlias> {
        let file = parse(&SourceContext::from_file("t.go", text)).unwrap();
        resolve_alias(&file, MARKER_IMPORT_PATH)
    }

    #[test]
    fn test_default_alias() {
        let alias = resolve("package p\n\nimport \"github.com/sysr-q/assets\"\n");
        assert_eq!(alias, Some(MarkerAlias::Named("assets".into())));
    }

    #[test]
    fn test_renamed_import() {
        let alias = resolve("package p\n\nimport (\n\t\"fmt\"\n\tres \"github.com/sysr-q/assets\"\n)\n");
        assert_eq!(alias, Some(MarkerAlias::Named("res".into())));
    }

    #[test]
    fn test_absent_import() {
        assert_eq!(resolve("package p\n\nimport \"fmt\"\n"), None);
    }

    #[test]
    fn test_last_import_wins() {
        let alias = resolve(
            "package p\n\nimport a \"github.com/sysr-q/assets\"\nimport b \"github.com/sysr-q/assets\"\n",
        );
        assert_eq!(alias, Some(MarkerAlias::Named("b".into())));
    }

    #[test]
    fn test_blank_and_dot_imports_are_unqualified() {
        assert_eq!(
            resolve("package p\n\nimport _ \"github.com/sysr-q/assets\"\n"),
            Some(MarkerAlias::Unqualified)
        );
        assert_eq!(
            resolve("package p\n\nimport . \"github.com/sysr-q/assets\"\n"),
            Some(MarkerAlias::Unqualified)
        );
    }

    #[test]
    fn test_default_package_name_skips_version_suffix() {
        assert_eq!(default_package_name("example.com/lib/v2"), "lib");
        assert_eq!(default_package_name("example.com/vendor"), "vendor");
        assert_eq!(default_package_name("assets"), "assets");
    }
}
