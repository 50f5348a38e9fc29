//! Spec file parser.
//!
//! Splits YAML front-matter from the markdown body, extracts
//! `<example>...</example>` blocks, and normalizes scalar values into
//! arrays for the list-valued reserved keys (`context`, `skills`).

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::{WeftError, WeftResult};
use crate::spec::{Example, Frontmatter, SpecFile};

/// Separator inside an `<example>` block between input and output.
const EXAMPLE_SEPARATOR: &str = "\n---\n";

/// Parse a spec file from disk.
pub fn parse(path: &Path) -> WeftResult<SpecFile> {
    let raw = fs::read_to_string(path).map_err(|e| WeftError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_str(path, &raw)
}

/// Parse spec content that has already been read.
pub fn parse_str(path: &Path, raw: &str) -> WeftResult<SpecFile> {
    let (front, body_src) = split_front_matter(raw);

    let frontmatter = match front {
        Some(yaml) if !yaml.trim().is_empty() => {
            let map: Mapping =
                serde_yaml::from_str(yaml).map_err(|e| WeftError::ParseError {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            frontmatter_from_mapping(map)
        }
        _ => Frontmatter::default(),
    };

    let (body, examples) = extract_examples(body_src);

    Ok(SpecFile {
        path: path.to_path_buf(),
        frontmatter,
        body,
        examples,
        raw: raw.to_string(),
    })
}

/// Resolve a spec's relative `context`/`skills` entries against its own
/// directory, returning the updated spec.
///
/// The cascade resolver does NOT use this — it resolves against the leaf's
/// directory. The compactor uses it so each fragment's paths keep their
/// original meaning before fragments from different directories are merged.
pub fn resolve_relative_paths(mut spec: SpecFile) -> SpecFile {
    let dir = spec
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    for entry in spec
        .frontmatter
        .context
        .iter_mut()
        .chain(spec.frontmatter.skills.iter_mut())
    {
        if !Path::new(entry.as_str()).is_absolute() {
            let joined = lexical_normalize(&dir.join(entry.as_str()));
            *entry = joined.to_string_lossy().into_owned();
        }
    }
    spec
}

/// Normalize `.` and `..` components lexically (no filesystem access).
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Split `---`-delimited front-matter from the body.
///
/// Returns `(Some(yaml), body)` when the file opens with a `---` line and
/// a closing `---` line exists; otherwise the whole file is body.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (None, content);
    };
    if let Some(end) = rest.find("\n---\n") {
        return (Some(&rest[..end]), &rest[end + 5..]);
    }
    if let Some(yaml) = rest.strip_suffix("\n---") {
        return (Some(yaml), "");
    }
    // Opening delimiter with no close: treat everything as body.
    (None, content)
}

/// Lift reserved keys out of the YAML mapping into typed fields.
fn frontmatter_from_mapping(map: Mapping) -> Frontmatter {
    let mut fm = Frontmatter::default();

    for (key, value) in map {
        let name = match &key {
            Value::String(s) => s.clone(),
            _ => {
                // Non-string keys are legal YAML; keep them as extensions.
                fm.extra.insert(key, value);
                continue;
            }
        };

        match name.as_str() {
            "name" => fm.name = scalar_string(&value),
            "description" => fm.description = scalar_string(&value),
            "output" => fm.output = scalar_string(&value),
            "prompt" => fm.prompt = scalar_string(&value),
            "context" => fm.context = string_list(&value),
            "skills" => fm.skills = string_list(&value),
            _ => {
                fm.extra.insert(Value::String(name), value);
            }
        }
    }
    fm
}

/// Coerce a YAML value into a scalar string.
///
/// Explicit `null` becomes the empty string: during a cascade merge both
/// overwrite the parent value identically, so nothing is lost.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a scalar-or-list value into a list of strings.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).map(|s| vec![s]).unwrap_or_default(),
    }
}

/// Pull `<example>` blocks out of the body.
///
/// Each block is split on an internal `\n---\n` line into input/output.
/// A block with no separator is all input. An unterminated `<example>`
/// tag is left in the body untouched.
fn extract_examples(body: &str) -> (String, Vec<Example>) {
    const OPEN: &str = "<example>";
    const CLOSE: &str = "</example>";

    let mut examples = Vec::new();
    let mut clean = String::new();
    let mut rest = body;

    while let Some(start) = rest.find(OPEN) {
        clean.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        match after.find(CLOSE) {
            Some(end) => {
                examples.push(split_example(&after[..end]));
                rest = &after[end + CLOSE.len()..];
            }
            None => {
                clean.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    clean.push_str(rest);

    (clean.trim().to_string(), examples)
}

fn split_example(inner: &str) -> Example {
    match inner.find(EXAMPLE_SEPARATOR) {
        Some(i) => Example {
            input: inner[..i].trim().to_string(),
            output: inner[i + EXAMPLE_SEPARATOR.len()..].trim().to_string(),
        },
        None => Example {
            input: inner.trim().to_string(),
            output: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_doc(raw: &str) -> SpecFile {
        parse_str(Path::new("/project/docs/api.spec.md"), raw).unwrap()
    }

    #[test]
    fn test_front_matter_and_body() {
        let spec = parse_doc("---\nname: api docs\noutput: api.md\n---\nDescribe the API.\n");
        assert_eq!(spec.frontmatter.name.as_deref(), Some("api docs"));
        assert_eq!(spec.frontmatter.output.as_deref(), Some("api.md"));
        assert_eq!(spec.body, "Describe the API.");
    }

    #[test]
    fn test_no_front_matter() {
        let spec = parse_doc("Just a body.\n");
        assert!(spec.frontmatter.is_empty());
        assert_eq!(spec.body, "Just a body.");
    }

    #[test]
    fn test_unclosed_front_matter_is_body() {
        let spec = parse_doc("---\nname: broken\n");
        assert!(spec.frontmatter.name.is_none());
        assert!(spec.body.contains("name: broken"));
    }

    #[test]
    fn test_scalar_context_normalized_to_array() {
        let spec = parse_doc("---\ncontext: ../README.md\n---\n");
        assert_eq!(spec.frontmatter.context, vec!["../README.md"]);
    }

    #[test]
    fn test_list_context() {
        let spec = parse_doc("---\ncontext:\n  - a.md\n  - b.md\n---\n");
        assert_eq!(spec.frontmatter.context, vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_explicit_null_becomes_empty_string() {
        let spec = parse_doc("---\nname: null\n---\n");
        assert_eq!(spec.frontmatter.name.as_deref(), Some(""));
    }

    #[test]
    fn test_unknown_keys_preserved_in_order() {
        let spec = parse_doc("---\ntone: formal\naudience: devs\n---\n");
        let keys: Vec<String> = spec
            .frontmatter
            .extra
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["tone", "audience"]);
    }

    #[test]
    fn test_example_extraction() {
        let spec = parse_doc(
            "Body text.\n<example>\nhello\n---\nbonjour\n</example>\nMore body.",
        );
        assert_eq!(spec.examples.len(), 1);
        assert_eq!(spec.examples[0].input, "hello");
        assert_eq!(spec.examples[0].output, "bonjour");
        assert!(spec.body.contains("Body text."));
        assert!(spec.body.contains("More body."));
        assert!(!spec.body.contains("<example>"));
    }

    #[test]
    fn test_example_without_separator_is_all_input() {
        let spec = parse_doc("<example>\nonly input\n</example>");
        assert_eq!(spec.examples[0].input, "only input");
        assert_eq!(spec.examples[0].output, "");
    }

    #[test]
    fn test_unterminated_example_stays_in_body() {
        let spec = parse_doc("start <example>\ndangling");
        assert!(spec.examples.is_empty());
        assert!(spec.body.contains("<example>"));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let result = parse_str(Path::new("/p/x.spec.md"), "---\n: [unbalanced\n---\n");
        assert!(matches!(result, Err(WeftError::ParseError { .. })));
    }

    #[test]
    fn test_resolve_relative_paths_uses_own_dir() {
        let spec = parse_doc("---\ncontext: ../shared/style.md\nskills: fmt.md\n---\n");
        let resolved = resolve_relative_paths(spec);
        assert_eq!(
            resolved.frontmatter.context,
            vec!["/project/shared/style.md"]
        );
        assert_eq!(resolved.frontmatter.skills, vec!["/project/docs/fmt.md"]);
    }

    #[test]
    fn test_resolve_leaves_absolute_paths_alone() {
        let spec = parse_doc("---\ncontext: /abs/ctx.md\n---\n");
        let resolved = resolve_relative_paths(spec);
        assert_eq!(resolved.frontmatter.context, vec!["/abs/ctx.md"]);
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }
}
