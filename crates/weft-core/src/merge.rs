//! Merge strategies shared by the cascade resolver and the compactor.
//!
//! Arrays, bodies, front-matter maps, and example lists each merge with
//! their own rules. An empty side is always absorbing: merging anything
//! with "nothing" yields the non-empty side regardless of strategy.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::spec::{Example, Frontmatter};

/// How two array-valued front-matter fields combine (parent, then child).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayStrategy {
    /// Parent items then child items, duplicates retained.
    Concatenate,
    /// Child items before parent items.
    Prepend,
    /// Child array discards the parent entirely.
    Replace,
    /// Concatenate, then keep the first occurrence of each item.
    Dedupe,
    /// Concatenate, then keep the last occurrence of each item.
    DedupeLast,
}

impl std::str::FromStr for ArrayStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concatenate" => Ok(ArrayStrategy::Concatenate),
            "prepend" => Ok(ArrayStrategy::Prepend),
            "replace" => Ok(ArrayStrategy::Replace),
            "dedupe" => Ok(ArrayStrategy::Dedupe),
            "dedupe-last" => Ok(ArrayStrategy::DedupeLast),
            other => Err(format!("unknown array merge strategy: '{other}'")),
        }
    }
}

/// How two spec bodies combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStrategy {
    /// Parent, blank line, child.
    Append,
    /// Child, blank line, parent.
    Prepend,
    /// Child only.
    Replace,
}

impl std::str::FromStr for BodyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(BodyStrategy::Append),
            "prepend" => Ok(BodyStrategy::Prepend),
            "replace" => Ok(BodyStrategy::Replace),
            other => Err(format!("unknown body merge strategy: '{other}'")),
        }
    }
}

/// Per-instance merge configuration.
///
/// `context` and `skills` may use independent strategies; every other
/// array-valued field always concatenates.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    pub context: ArrayStrategy,
    pub skills: ArrayStrategy,
    pub body: BodyStrategy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            context: ArrayStrategy::Dedupe,
            skills: ArrayStrategy::Dedupe,
            body: BodyStrategy::Append,
        }
    }
}

/// Merge two arrays per the strategy. An empty side yields the other side
/// unchanged, for every strategy.
pub fn merge_arrays(parent: &[String], child: &[String], strategy: ArrayStrategy) -> Vec<String> {
    if parent.is_empty() {
        return child.to_vec();
    }
    if child.is_empty() {
        return parent.to_vec();
    }

    match strategy {
        ArrayStrategy::Replace => child.to_vec(),
        ArrayStrategy::Prepend => child.iter().chain(parent).cloned().collect(),
        ArrayStrategy::Concatenate => parent.iter().chain(child).cloned().collect(),
        ArrayStrategy::Dedupe => dedupe_first(parent.iter().chain(child)),
        ArrayStrategy::DedupeLast => dedupe_last(parent.iter().chain(child)),
    }
}

/// Keep the first occurrence of each distinct item.
pub fn dedupe_first<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = BTreeMap::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone(), ()).is_none() {
            out.push(item.clone());
        }
    }
    out
}

/// Keep the last occurrence of each distinct item, ordered by the
/// concatenated position of the occurrence that survives.
fn dedupe_last<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let combined: Vec<&String> = items.collect();
    let mut last_index: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, item) in combined.iter().enumerate() {
        last_index.insert(item.as_str(), i);
    }
    combined
        .iter()
        .enumerate()
        .filter(|(i, item)| last_index[item.as_str()] == *i)
        .map(|(_, item)| (*item).clone())
        .collect()
}

/// Merge two bodies. Empty/whitespace-only sides are absorbing: the other
/// side wins outright with no separator inserted.
pub fn merge_body(parent: &str, child: &str, strategy: BodyStrategy) -> String {
    if parent.trim().is_empty() {
        return child.to_string();
    }
    if child.trim().is_empty() {
        return parent.to_string();
    }

    match strategy {
        BodyStrategy::Append => format!("{parent}\n\n{child}"),
        BodyStrategy::Prepend => format!("{child}\n\n{parent}"),
        BodyStrategy::Replace => child.to_string(),
    }
}

/// Merge front-matter, child over parent.
///
/// Array fields combine per the configured strategies; scalar fields from
/// the child unconditionally overwrite the parent, including explicit
/// null/empty values. Unknown extension keys follow the same rule, with
/// sequence-valued extensions always concatenating.
pub fn merge_frontmatter(
    parent: &Frontmatter,
    child: &Frontmatter,
    options: &MergeOptions,
) -> Frontmatter {
    let mut merged = Frontmatter {
        name: child.name.clone().or_else(|| parent.name.clone()),
        description: child
            .description
            .clone()
            .or_else(|| parent.description.clone()),
        context: merge_arrays(&parent.context, &child.context, options.context),
        skills: merge_arrays(&parent.skills, &child.skills, options.skills),
        output: child.output.clone().or_else(|| parent.output.clone()),
        prompt: child.prompt.clone().or_else(|| parent.prompt.clone()),
        extra: parent.extra.clone(),
    };

    for (key, value) in &child.extra {
        match (merged.extra.get_mut(key), value) {
            (Some(Value::Sequence(existing)), Value::Sequence(incoming)) => {
                existing.extend(incoming.iter().cloned());
            }
            _ => {
                merged.extra.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Merge example lists: parent-then-child, deduplicated by exact `input`
/// match, first occurrence wins. Repeating an input at a deeper level with
/// a different output does NOT replace the earlier example.
pub fn merge_examples(parent: &[Example], child: &[Example]) -> Vec<Example> {
    let mut out: Vec<Example> = Vec::new();
    for example in parent.iter().chain(child) {
        if !out.iter().any(|e| e.input == example.input) {
            out.push(example.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const ALL_STRATEGIES: [ArrayStrategy; 5] = [
        ArrayStrategy::Concatenate,
        ArrayStrategy::Prepend,
        ArrayStrategy::Replace,
        ArrayStrategy::Dedupe,
        ArrayStrategy::DedupeLast,
    ];

    #[test]
    fn test_empty_sides_absorbing_for_every_strategy() {
        let items = v(&["a", "b"]);
        for strategy in ALL_STRATEGIES {
            assert_eq!(merge_arrays(&[], &items, strategy), items);
            assert_eq!(merge_arrays(&items, &[], strategy), items);
        }
    }

    #[test]
    fn test_concatenate_retains_duplicates() {
        assert_eq!(
            merge_arrays(&v(&["a", "b"]), &v(&["b", "c"]), ArrayStrategy::Concatenate),
            v(&["a", "b", "b", "c"])
        );
    }

    #[test]
    fn test_prepend_puts_child_first() {
        assert_eq!(
            merge_arrays(&v(&["p"]), &v(&["c"]), ArrayStrategy::Prepend),
            v(&["c", "p"])
        );
    }

    #[test]
    fn test_replace_discards_parent() {
        assert_eq!(
            merge_arrays(&v(&["p1", "p2"]), &v(&["c"]), ArrayStrategy::Replace),
            v(&["c"])
        );
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let result = merge_arrays(&v(&["a", "b"]), &v(&["b", "c", "a"]), ArrayStrategy::Dedupe);
        assert_eq!(result, v(&["a", "b", "c"]));
    }

    #[test]
    fn test_dedupe_result_is_subset_with_no_repeats() {
        let parent = v(&["x", "y", "x"]);
        let child = v(&["y", "z"]);
        let result = merge_arrays(&parent, &child, ArrayStrategy::Dedupe);
        for item in &result {
            assert!(parent.contains(item) || child.contains(item));
        }
        let mut sorted = result.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), result.len());
    }

    #[test]
    fn test_dedupe_last_keeps_last_occurrence() {
        // Concatenated: a b b c a — kept occurrences are b(2) c(3) a(4).
        let result = merge_arrays(
            &v(&["a", "b"]),
            &v(&["b", "c", "a"]),
            ArrayStrategy::DedupeLast,
        );
        assert_eq!(result, v(&["b", "c", "a"]));
    }

    #[test]
    fn test_body_empty_absorbing() {
        for strategy in [BodyStrategy::Append, BodyStrategy::Prepend, BodyStrategy::Replace] {
            assert_eq!(merge_body("", "child", strategy), "child");
            assert_eq!(merge_body("parent", "", strategy), "parent");
            assert_eq!(merge_body("parent", "   \n", strategy), "parent");
        }
    }

    #[test]
    fn test_body_append_inserts_blank_line() {
        assert_eq!(merge_body("a", "b", BodyStrategy::Append), "a\n\nb");
    }

    #[test]
    fn test_body_prepend() {
        assert_eq!(merge_body("a", "b", BodyStrategy::Prepend), "b\n\na");
    }

    #[test]
    fn test_body_replace() {
        assert_eq!(merge_body("a", "b", BodyStrategy::Replace), "b");
    }

    #[test]
    fn test_frontmatter_child_scalar_overwrites() {
        let parent = Frontmatter {
            name: Some("parent".into()),
            output: Some("old.md".into()),
            ..Default::default()
        };
        let child = Frontmatter {
            name: Some(String::new()), // explicit null/empty still overwrites
            output: Some("new.md".into()),
            ..Default::default()
        };
        let merged = merge_frontmatter(&parent, &child, &MergeOptions::default());
        assert_eq!(merged.name.as_deref(), Some(""));
        assert_eq!(merged.output.as_deref(), Some("new.md"));
    }

    #[test]
    fn test_frontmatter_absent_child_scalar_keeps_parent() {
        let parent = Frontmatter {
            description: Some("kept".into()),
            ..Default::default()
        };
        let merged = merge_frontmatter(&parent, &Frontmatter::default(), &MergeOptions::default());
        assert_eq!(merged.description.as_deref(), Some("kept"));
    }

    #[test]
    fn test_frontmatter_independent_array_strategies() {
        let parent = Frontmatter {
            context: v(&["base.md"]),
            skills: v(&["lint"]),
            ..Default::default()
        };
        let child = Frontmatter {
            context: v(&["extra.md"]),
            skills: v(&["fmt"]),
            ..Default::default()
        };
        let options = MergeOptions {
            context: ArrayStrategy::Replace,
            skills: ArrayStrategy::Concatenate,
            body: BodyStrategy::Append,
        };
        let merged = merge_frontmatter(&parent, &child, &options);
        assert_eq!(merged.context, v(&["extra.md"]));
        assert_eq!(merged.skills, v(&["lint", "fmt"]));
    }

    #[test]
    fn test_frontmatter_extra_sequences_concatenate() {
        use serde_yaml::Value;

        let mut parent = Frontmatter::default();
        parent.extra.insert(
            Value::String("tags".into()),
            serde_yaml::from_str("[a, b]").unwrap(),
        );
        let mut child = Frontmatter::default();
        child.extra.insert(
            Value::String("tags".into()),
            serde_yaml::from_str("[c]").unwrap(),
        );

        let merged = merge_frontmatter(&parent, &child, &MergeOptions::default());
        let tags = merged.extra.get(&Value::String("tags".into())).unwrap();
        assert_eq!(
            tags.as_sequence().unwrap().len(),
            3,
            "extension sequences should concatenate"
        );
    }

    #[test]
    fn test_frontmatter_extra_scalar_overwrites_even_with_null() {
        use serde_yaml::Value;

        let mut parent = Frontmatter::default();
        parent
            .extra
            .insert(Value::String("tone".into()), Value::String("formal".into()));
        let mut child = Frontmatter::default();
        child.extra.insert(Value::String("tone".into()), Value::Null);

        let merged = merge_frontmatter(&parent, &child, &MergeOptions::default());
        assert_eq!(
            merged.extra.get(&Value::String("tone".into())),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_examples_dedupe_by_input_first_wins() {
        let parent = vec![Example {
            input: "q".into(),
            output: "parent answer".into(),
        }];
        let child = vec![
            Example {
                input: "q".into(),
                output: "child answer".into(),
            },
            Example {
                input: "q2".into(),
                output: "a2".into(),
            },
        ];
        let merged = merge_examples(&parent, &child);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].output, "parent answer");
        assert_eq!(merged[1].input, "q2");
    }
}
