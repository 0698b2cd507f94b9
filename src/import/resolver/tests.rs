use super::*;
use crate::testing::{tree, InMemoryConfigFiles};
use serde_json::json;
use std::sync::OnceLock;

fn resolver(files: &InMemoryConfigFiles) -> Arc<ImportsResolver> {
    ImportsResolver::with_default_factories(Arc::new(files.clone()), Arc::new(files.clone()))
}

fn resolve(files: &InMemoryConfigFiles, file: &str) -> Result<ConfigTree> {
    let content = files.read(Path::new(file))?;
    resolver(files).process(content, Path::new(file))
}

#[test]
fn test_content_without_imports_is_unchanged() {
    let files = InMemoryConfigFiles::new();
    let content = tree(json!({"workflows": {"order": {"entity": "Order"}}}));

    let result = resolver(&files)
        .process(content.clone(), Path::new("order.yml"))
        .unwrap();
    assert_eq!(result, content);

    let result = resolver(&files)
        .process(
            tree(json!({"imports": null, "workflows": {"order": {"entity": "Order"}}})),
            Path::new("order.yml"),
        )
        .unwrap();
    assert_eq!(result, content);
}

#[test]
fn test_imports_must_be_a_sequence() {
    let files = InMemoryConfigFiles::new();

    let err = resolver(&files)
        .process(tree(json!({"imports": "base.yml"})), Path::new("order.yml"))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_TYPE);
}

#[test]
fn test_unknown_declaration() {
    let files = InMemoryConfigFiles::new();

    let err = resolver(&files)
        .process(
            tree(json!({"imports": [{"workflow": "base"}]})),
            Path::new("order.yml"),
        )
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::VALIDATION_UNKNOWN_DIRECTIVE);
}

#[test]
fn test_workflow_import_skips_reentrant_visit_of_importing_file() {
    let files = InMemoryConfigFiles::new()
        .with_file(
            "child.yml",
            tree(json!({
                "imports": [{"workflow": "base", "as": "child", "replace": []}],
                "workflows": {"child": {"entity": "Child"}}
            })),
        )
        .with_file(
            "base.yml",
            tree(json!({"workflows": {"base": {"steps": {"open": null}}}})),
        );
    let resolver = resolver(&files);

    let content = files.read(Path::new("child.yml")).unwrap();
    let result = resolver.process(content, Path::new("child.yml")).unwrap();

    assert_eq!(
        serde_json::Value::Object(result),
        json!({"workflows": {"child": {"entity": "Child", "steps": {"open": null}}}})
    );
    assert!(!resolver.in_progress());
}

#[test]
fn test_self_import_terminates() {
    let files = InMemoryConfigFiles::new().with_file(
        "flow.yml",
        tree(json!({
            "imports": [{"workflow": "flow", "as": "flow", "replace": []}],
            "workflows": {"flow": {"entity": "Flow", "steps": {"a": null}}}
        })),
    );

    let result = resolve(&files, "flow.yml").unwrap();

    assert_eq!(
        result["workflows"]["flow"],
        json!({"entity": "Flow", "steps": {"a": null}})
    );
}

#[test]
fn test_mutual_workflow_imports_fail() {
    let files = InMemoryConfigFiles::new()
        .with_file(
            "x.yml",
            tree(json!({
                "imports": [{"workflow": "y", "as": "x", "replace": []}],
                "workflows": {"x": {}}
            })),
        )
        .with_file(
            "y.yml",
            tree(json!({
                "imports": [{"workflow": "x", "as": "y", "replace": []}],
                "workflows": {"y": {}}
            })),
        );
    let resolver = resolver(&files);

    let content = files.read(Path::new("x.yml")).unwrap();
    let err = resolver
        .process(content, Path::new("x.yml"))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::WORKFLOW_CIRCULAR_IMPORT);
    assert_eq!(
        err.to_string(),
        "Recursion met. File `y.yml` tries to import workflow `x` for `y` that imports it too in `x.yml`."
    );
    assert!(!resolver.in_progress());
}

#[test]
fn test_nested_imports_resolve_leaf_first() {
    let files = InMemoryConfigFiles::new()
        .with_file(
            "child.yml",
            tree(json!({
                "imports": [{"workflow": "base", "as": "child", "replace": []}],
                "workflows": {"child": {}}
            })),
        )
        .with_file(
            "base.yml",
            tree(json!({
                "imports": [{"workflow": "root", "as": "base", "replace": []}],
                "workflows": {"base": {"steps": {"b": null}}}
            })),
        )
        .with_file(
            "root.yml",
            tree(json!({"workflows": {"root": {"entity": "Root", "steps": {"r": null}}}})),
        );

    let result = resolve(&files, "child.yml").unwrap();

    assert_eq!(
        result["workflows"]["child"],
        json!({"steps": {"b": null, "r": null}, "entity": "Root"})
    );
}

#[test]
fn test_resource_import() {
    let files = InMemoryConfigFiles::new()
        .with_file(
            "config/main.yml",
            tree(json!({
                "imports": ["./shared.yml"],
                "workflows": {"order": {"entity": "Local"}}
            })),
        )
        .with_file(
            "config/shared.yml",
            tree(json!({
                "imports": [{"resource": "./base/common.yml"}],
                "workflows": {"order": {"steps": {"open": null}}, "invoice": {}}
            })),
        )
        .with_file(
            "config/base/common.yml",
            tree(json!({"workflows": {"order": {"entity": "Common", "steps": {"new": null}}}})),
        );

    let result = resolve(&files, "config/main.yml").unwrap();

    assert_eq!(
        serde_json::Value::Object(result),
        json!({
            "workflows": {
                "order": {"entity": "Local", "steps": {"new": null, "open": null}},
                "invoice": {}
            }
        })
    );
}

#[test]
fn test_resource_imported_twice_on_the_stack_fails() {
    let files = InMemoryConfigFiles::new()
        .with_file("a.yml", tree(json!({"imports": ["./b.yml"]})))
        .with_file("b.yml", tree(json!({"imports": ["./c.yml"]})))
        .with_file("c.yml", tree(json!({"imports": ["./b.yml"]})));

    let err = resolve(&files, "a.yml").unwrap_err();

    assert_eq!(err.code(), ErrorCode::WORKFLOW_CIRCULAR_IMPORT);
    assert_eq!(
        err.to_string(),
        "Recursion met. File `c.yml` tries to import `b.yml` that is already being imported from `a.yml`."
    );
}

#[test]
fn test_resource_cycle_fails_from_every_entry_point() {
    let files = InMemoryConfigFiles::new()
        .with_file("a.yml", tree(json!({"imports": ["./b.yml"]})))
        .with_file("b.yml", tree(json!({"imports": ["./c.yml"]})))
        .with_file("c.yml", tree(json!({"imports": ["./b.yml"]})));

    for entry in ["a.yml", "b.yml", "c.yml"] {
        let err = resolve(&files, entry).unwrap_err();
        assert_eq!(err.code(), ErrorCode::WORKFLOW_CIRCULAR_IMPORT, "{}", entry);
    }

    let err = resolve(&files, "b.yml").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Recursion met. File `c.yml` tries to import `b.yml` that is still being resolved."
    );
}

#[test]
fn test_resource_importing_itself_fails() {
    let files = InMemoryConfigFiles::new()
        .with_file("flows/a.yml", tree(json!({"imports": ["../flows/a.yml"]})));

    let err = resolve(&files, "flows/a.yml").unwrap_err();

    assert_eq!(err.code(), ErrorCode::WORKFLOW_CIRCULAR_IMPORT);
    assert_eq!(
        err.to_string(),
        "Recursion met. File `flows/a.yml` tries to import `flows/a.yml` that is still being resolved."
    );
}

#[test]
fn test_workflow_scan_reaching_file_that_imports_the_root_fails() {
    let files = InMemoryConfigFiles::new()
        .with_file(
            "child.yml",
            tree(json!({
                "imports": [{"workflow": "base", "as": "child", "replace": []}],
                "workflows": {"child": {}}
            })),
        )
        .with_file(
            "base.yml",
            tree(json!({
                "imports": ["./child.yml"],
                "workflows": {"base": {"entity": "Base"}}
            })),
        );

    for entry in ["child.yml", "base.yml"] {
        let err = resolve(&files, entry).unwrap_err();
        assert_eq!(err.code(), ErrorCode::WORKFLOW_CIRCULAR_IMPORT, "{}", entry);
    }
}

#[test]
fn test_workflow_import_from_named_file() {
    let files = InMemoryConfigFiles::new()
        .with_file(
            "config/child.yml",
            tree(json!({
                "imports": [{
                    "resource": "./lib/base.yml",
                    "workflow": "base",
                    "as": "child",
                    "replace": ["steps"]
                }],
                "workflows": {"child": {"steps": {"draft": null}}}
            })),
        )
        .with_file(
            "config/other.yml",
            tree(json!({"workflows": {"base": {"entity": "Wrong"}}})),
        )
        .with_file(
            "config/lib/base.yml",
            tree(json!({"workflows": {"base": {"entity": "Base", "steps": {"open": null}}}})),
        );

    let result = resolve(&files, "config/child.yml").unwrap();

    assert_eq!(
        result["workflows"]["child"],
        json!({"steps": {"open": null}, "entity": "Base"})
    );
}

#[test]
fn test_missing_workflow_is_reported() {
    let files = InMemoryConfigFiles::new().with_file(
        "child.yml",
        tree(json!({"imports": [{"workflow": "workflow_to_import", "as": "child", "replace": []}]})),
    );

    let err = resolve(&files, "child.yml").unwrap_err();

    assert_eq!(err.code(), ErrorCode::IMPORT_WORKFLOW_NOT_FOUND);
    assert_eq!(
        err.to_string(),
        "Can not find workflow `workflow_to_import` for import."
    );
}

/// Reader recording the resolver's in-progress state on every read
struct ProbingReader {
    files: InMemoryConfigFiles,
    resolver: OnceLock<Weak<ImportsResolver>>,
    observed: Mutex<Vec<bool>>,
}

impl ConfigFileReader for ProbingReader {
    fn read(&self, file: &Path) -> Result<ConfigTree> {
        let flag = self
            .resolver
            .get()
            .and_then(Weak::upgrade)
            .map(|r| r.in_progress())
            .unwrap_or(false);
        self.observed.lock().unwrap().push(flag);
        self.files.read(file)
    }
}

#[test]
fn test_in_progress_while_imports_run() {
    let files = InMemoryConfigFiles::new()
        .with_file("base.yml", tree(json!({"workflows": {"base": {}}})));
    let reader = Arc::new(ProbingReader {
        files: files.clone(),
        resolver: OnceLock::new(),
        observed: Mutex::new(Vec::new()),
    });
    let resolver = ImportsResolver::with_default_factories(reader.clone(), Arc::new(files));
    reader.resolver.set(Arc::downgrade(&resolver)).unwrap();

    assert!(!resolver.in_progress());
    resolver
        .process(
            tree(json!({"imports": [{"workflow": "base", "as": "child", "replace": []}]})),
            Path::new("child.yml"),
        )
        .unwrap();
    assert!(!resolver.in_progress());

    assert_eq!(*reader.observed.lock().unwrap(), vec![true]);
}
