//! Structural diff between two JSON trees
//!
//! Produces an ordered list of JSON-patch style operations (`add`, `remove`,
//! `replace`, `move`) addressed by JSON pointers. Applied in order to the old
//! tree, the operations yield the new tree.
//!
//! Ordering is deterministic: object keys are visited in sorted order, depth
//! first. Arrays are diffed by trimming the common head and tail, matching
//! the remaining items by longest common subsequence and then detecting items
//! that were only reordered, which are emitted as `move` operations. Objects
//! (or arrays) left unmatched at the same index are diffed recursively.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Kind of a patch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Move,
}

/// One path-addressed operation of a patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    /// Source pointer, set for `move` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// New value, set for `add` and `replace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn new(op: PatchOp, path: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
            from: None,
            value: None,
        }
    }

    fn add(path: String, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(PatchOp::Add, path)
        }
    }

    fn replace(path: String, value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(PatchOp::Replace, path)
        }
    }

    fn moved(from: String, path: String) -> Self {
        Self {
            from: Some(from),
            ..Self::new(PatchOp::Move, path)
        }
    }
}

/// Compute the patch turning `old` into `new`
pub fn diff(old: &Value, new: &Value) -> Vec<PatchOperation> {
    let mut ops = Vec::new();
    diff_values(old, new, "", &mut ops);
    ops
}

fn diff_values(old: &Value, new: &Value, path: &str, ops: &mut Vec<PatchOperation>) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(a, b, path, ops),
        (Value::Array(a), Value::Array(b)) => diff_arrays(a, b, path, ops),
        _ => ops.push(PatchOperation::replace(path.to_string(), new.clone())),
    }
}

fn diff_objects(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    path: &str,
    ops: &mut Vec<PatchOperation>,
) {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        let child = child_path(path, key);
        match (old.get(key), new.get(key)) {
            (Some(_), None) => ops.push(PatchOperation::new(PatchOp::Remove, child)),
            (None, Some(value)) => ops.push(PatchOperation::add(child, value.clone())),
            (Some(a), Some(b)) => diff_values(a, b, &child, ops),
            (None, None) => {},
        }
    }
}

fn diff_arrays(old: &[Value], new: &[Value], path: &str, ops: &mut Vec<PatchOperation>) {
    let mut start = 0;
    while start < old.len() && start < new.len() && old[start] == new[start] {
        start += 1;
    }
    let (mut end_old, mut end_new) = (old.len(), new.len());
    while end_old > start && end_new > start && old[end_old - 1] == new[end_new - 1] {
        end_old -= 1;
        end_new -= 1;
    }
    let old = &old[start..end_old];
    let new = &new[start..end_new];

    // new_source[j] is the old item that ends up at new position j
    let mut old_target: Vec<Option<usize>> = vec![None; old.len()];
    let mut new_source: Vec<Option<usize>> = vec![None; new.len()];
    for (i, j) in longest_common_subsequence(old, new) {
        old_target[i] = Some(j);
        new_source[j] = Some(i);
    }

    // Equal items outside the common subsequence were reordered
    for j in 0..new.len() {
        if new_source[j].is_some() {
            continue;
        }
        if let Some(i) = (0..old.len()).find(|&i| old_target[i].is_none() && old[i] == new[j]) {
            old_target[i] = Some(j);
            new_source[j] = Some(i);
        }
    }

    // Containers left at the same index are edited in place
    let mut nested = Vec::new();
    for i in 0..old.len().min(new.len()) {
        if old_target[i].is_none() && new_source[i].is_none() && same_container_kind(&old[i], &new[i])
        {
            old_target[i] = Some(i);
            new_source[i] = Some(i);
            nested.push(i);
        }
    }

    let index_path = |idx: usize| child_path(path, &(start + idx).to_string());

    // Replay the edit on a list of old indices (None marks inserted items)
    // so every emitted pointer is valid at the moment it is applied.
    let mut current: Vec<Option<usize>> = (0..old.len()).map(Some).collect();
    for i in (0..old.len()).rev() {
        if old_target[i].is_some() {
            continue;
        }
        if let Some(pos) = current.iter().position(|slot| *slot == Some(i)) {
            current.remove(pos);
            ops.push(PatchOperation::new(PatchOp::Remove, index_path(pos)));
        }
    }
    for j in 0..new.len() {
        match new_source[j] {
            None => {
                current.insert(j, None);
                ops.push(PatchOperation::add(index_path(j), new[j].clone()));
            },
            Some(i) => {
                if let Some(pos) = current.iter().position(|slot| *slot == Some(i)) {
                    if pos != j {
                        let slot = current.remove(pos);
                        current.insert(j, slot);
                        ops.push(PatchOperation::moved(index_path(pos), index_path(j)));
                    }
                }
            },
        }
    }

    for i in nested {
        diff_values(&old[i], &new[i], &index_path(i), ops);
    }
}

fn same_container_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}

/// Index pairs of one longest common subsequence, in increasing order
fn longest_common_subsequence(old: &[Value], new: &[Value]) -> Vec<(usize, usize)> {
    let (n, m) = (old.len(), new.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

fn child_path(parent: &str, token: &str) -> String {
    format!("{}/{}", parent, token.replace('~', "~0").replace('/', "~1"))
}
