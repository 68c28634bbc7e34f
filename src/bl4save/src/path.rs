//! Dotted/bracketed paths into a YAML tree (`state.inventory.items[2].serial`).
//!
//! Tagged nodes (`!tag value`) are transparent: a path walks straight through
//! to the tagged value, and the tag itself is left untouched on write.

use serde_yaml::{Mapping, Value};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path is empty: {0:?}")]
    Empty(String),

    #[error("Invalid array index: {0}")]
    InvalidIndex(String),

    #[error("Unclosed '[' in path: {0}")]
    UnclosedBracket(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Array index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    #[error("Expected a mapping at key {0}")]
    NotAMapping(String),

    #[error("Expected a sequence at index {0}")]
    NotASequence(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Split a path into key and index segments
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, PathError> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
                let mut index_str = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    index_str.push(next);
                }
                if !closed {
                    return Err(PathError::UnclosedBracket(path.to_string()));
                }
                let index = index_str
                    .parse()
                    .map_err(|_| PathError::InvalidIndex(index_str))?;
                segments.push(PathSegment::Index(index));
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    if segments.is_empty() {
        return Err(PathError::Empty(path.to_string()));
    }

    Ok(segments)
}

/// Path of a mapping entry below `parent`
pub fn child_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Path of a sequence element below `parent`
pub fn child_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Innermost value under any number of tags
fn untag_mut(value: &mut Value) -> &mut Value {
    match value {
        Value::Tagged(tagged) => untag_mut(&mut tagged.value),
        other => other,
    }
}

fn mapping_mut(value: &mut Value) -> Option<&mut Mapping> {
    match value {
        Value::Mapping(map) => Some(map),
        Value::Tagged(tagged) => mapping_mut(&mut tagged.value),
        _ => None,
    }
}

fn sequence_mut(value: &mut Value) -> Option<&mut Vec<Value>> {
    match value {
        Value::Sequence(seq) => Some(seq),
        Value::Tagged(tagged) => sequence_mut(&mut tagged.value),
        _ => None,
    }
}

fn step<'a>(current: &'a Value, segment: &PathSegment) -> Result<&'a Value, PathError> {
    match (segment, untag(current)) {
        (PathSegment::Key(key), Value::Mapping(map)) => map
            .get(key.as_str())
            .ok_or_else(|| PathError::KeyNotFound(key.clone())),
        (PathSegment::Key(key), _) => Err(PathError::NotAMapping(key.clone())),
        (PathSegment::Index(index), Value::Sequence(seq)) => seq
            .get(*index)
            .ok_or(PathError::IndexOutOfBounds(*index)),
        (PathSegment::Index(index), _) => Err(PathError::NotASequence(*index)),
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &PathSegment) -> Result<&'a mut Value, PathError> {
    match segment {
        PathSegment::Key(key) => mapping_mut(current)
            .ok_or_else(|| PathError::NotAMapping(key.clone()))?
            .get_mut(key.as_str())
            .ok_or_else(|| PathError::KeyNotFound(key.clone())),
        PathSegment::Index(index) => sequence_mut(current)
            .ok_or(PathError::NotASequence(*index))?
            .get_mut(*index)
            .ok_or(PathError::IndexOutOfBounds(*index)),
    }
}

/// Look up the node at `path`
pub fn resolve<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    parse_path(path)?
        .iter()
        .try_fold(root, |current, segment| step(current, segment))
}

/// Look up the node at `path` for modification
pub fn resolve_mut<'a>(root: &'a mut Value, path: &str) -> Result<&'a mut Value, PathError> {
    parse_path(path)?
        .iter()
        .try_fold(root, |current, segment| step_mut(current, segment))
}

/// Replace the node at `path`.
///
/// Every parent must already exist. A trailing key is inserted if its mapping
/// lacks it; a trailing index must be in bounds. A tagged target keeps its
/// tag and only the tagged value is replaced.
pub fn set_path(root: &mut Value, path: &str, new_value: Value) -> Result<(), PathError> {
    let segments = parse_path(path)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(PathError::Empty(path.to_string()));
    };

    let parent = parents
        .iter()
        .try_fold(root, |current, segment| step_mut(current, segment))?;

    match last {
        PathSegment::Key(key) => {
            let map = mapping_mut(parent).ok_or_else(|| PathError::NotAMapping(key.clone()))?;
            match map.get_mut(key.as_str()) {
                Some(existing) => *untag_mut(existing) = new_value,
                None => {
                    map.insert(Value::String(key.clone()), new_value);
                }
            }
        }
        PathSegment::Index(_) => *untag_mut(step_mut(parent, last)?) = new_value,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Value {
        serde_yaml::from_str(
            r#"
state:
  experience:
    - level: 10
    - level: 5
  tagged: !custom
    inner: value
  list: !seq
    - a
    - b
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_path_segments() {
        assert_eq!(
            parse_path("a.b[2].c").unwrap(),
            vec![
                PathSegment::Key("a".into()),
                PathSegment::Key("b".into()),
                PathSegment::Index(2),
                PathSegment::Key("c".into()),
            ]
        );
        assert_eq!(parse_path("[0]").unwrap(), vec![PathSegment::Index(0)]);
        assert_eq!(
            parse_path("a[1][2]").unwrap(),
            vec![
                PathSegment::Key("a".into()),
                PathSegment::Index(1),
                PathSegment::Index(2),
            ]
        );
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(matches!(parse_path(""), Err(PathError::Empty(_))));
        assert!(matches!(parse_path("."), Err(PathError::Empty(_))));
        assert!(matches!(parse_path("a[x]"), Err(PathError::InvalidIndex(_))));
        assert!(matches!(parse_path("a[]"), Err(PathError::InvalidIndex(_))));
        assert!(matches!(parse_path("a[1"), Err(PathError::UnclosedBracket(_))));
    }

    #[test]
    fn test_child_paths_parse_back() {
        let path = child_key(&child_index(&child_key("", "items"), 3), "serial");
        assert_eq!(path, "items[3].serial");
        assert_eq!(child_index("", 0), "[0]");
        assert_eq!(
            parse_path(&path).unwrap().last(),
            Some(&PathSegment::Key("serial".into()))
        );
    }

    #[test]
    fn test_segment_display() {
        let rendered: Vec<String> = parse_path("a[4]")
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, vec!["a", "[4]"]);
    }

    #[test]
    fn test_resolve() {
        let root = tree();
        assert_eq!(
            resolve(&root, "state.experience[1].level").unwrap().as_u64(),
            Some(5)
        );
        assert!(matches!(
            resolve(&root, "state.missing"),
            Err(PathError::KeyNotFound(_))
        ));
        assert!(matches!(
            resolve(&root, "state.experience[9]"),
            Err(PathError::IndexOutOfBounds(9))
        ));
        assert!(matches!(
            resolve(&root, "state[0]"),
            Err(PathError::NotASequence(0))
        ));
    }

    #[test]
    fn test_resolve_through_tags() {
        let root = tree();
        assert_eq!(
            resolve(&root, "state.tagged.inner").unwrap().as_str(),
            Some("value")
        );
        assert_eq!(resolve(&root, "state.list[1]").unwrap().as_str(), Some("b"));
    }

    #[test]
    fn test_set_path_keeps_tags() {
        let mut root = tree();
        set_path(&mut root, "state.tagged.inner", Value::String("new".into())).unwrap();
        set_path(&mut root, "state.list[0]", Value::String("z".into())).unwrap();

        let yaml = serde_yaml::to_string(&root).unwrap();
        assert!(yaml.contains("!custom"));
        assert!(yaml.contains("!seq"));
        assert_eq!(
            resolve(&root, "state.tagged.inner").unwrap().as_str(),
            Some("new")
        );
        assert_eq!(resolve(&root, "state.list[0]").unwrap().as_str(), Some("z"));
    }

    #[test]
    fn test_set_path_keeps_leaf_tags() {
        let mut root: Value = serde_yaml::from_str(
            "a: !ser \"@UgrhQAAAcAAAADAAAAWicAAAAAAAAAAAAA\"\nb:\n  - !ser old\n  - plain\n",
        )
        .unwrap();

        set_path(&mut root, "a", Value::String("@UgrA".into())).unwrap();
        set_path(&mut root, "b[0]", Value::String("new".into())).unwrap();

        assert!(matches!(&root["a"], Value::Tagged(t) if t.value.as_str() == Some("@UgrA")));
        assert!(matches!(&root["b"][0], Value::Tagged(t) if t.value.as_str() == Some("new")));

        let yaml = serde_yaml::to_string(&root).unwrap();
        assert_eq!(yaml.matches("!ser").count(), 2, "{}", yaml);
        assert!(!yaml.contains("old"));
        assert!(!yaml.contains("hQAAA"));
    }

    #[test]
    fn test_set_path_inserts_trailing_key_only() {
        let mut root = tree();
        set_path(&mut root, "state.added", Value::Bool(true)).unwrap();
        assert_eq!(resolve(&root, "state.added").unwrap().as_bool(), Some(true));

        assert!(matches!(
            set_path(&mut root, "state.nope.deeper", Value::Null),
            Err(PathError::KeyNotFound(_))
        ));
        assert!(matches!(
            set_path(&mut root, "state.experience[5]", Value::Null),
            Err(PathError::IndexOutOfBounds(5))
        ));
    }

    #[test]
    fn test_resolve_mut() {
        let mut root = tree();
        *resolve_mut(&mut root, "state.experience[0].level").unwrap() = Value::from(42);
        assert_eq!(
            resolve(&root, "state.experience[0].level").unwrap().as_u64(),
            Some(42)
        );
    }
}
