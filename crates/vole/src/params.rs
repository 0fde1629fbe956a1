// ParamTree — nested string-keyed parameter storage
//
// Checkpoints store a flat mapping from `/`-separated paths to arrays
// ("model/weight"). In memory the same parameters form a tree: each key
// maps to either a leaf array or another such mapping. flatten() and
// from_flat() are the documented pair converting between the two views.

use std::collections::BTreeMap;

use ndarray::ArrayD;

/// Errors from parameter-tree operations.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// Paths must contain at least one non-empty segment.
    #[error("empty parameter path")]
    EmptyPath,

    /// A path segment runs through an existing leaf.
    #[error("path runs through leaf parameter at {path}")]
    LeafConflict { path: String },

    /// The addressed node is a subtree, not a parameter.
    #[error("{path} is a subtree, not a parameter")]
    NotALeaf { path: String },

    /// No parameter exists at the given path.
    #[error("no parameter at {path}")]
    Missing { path: String },

    /// Loaded value does not fit the existing parameter.
    #[error("shape mismatch at {path}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        path: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

/// One node of the tree: a parameter array or a nested mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamNode {
    Leaf(ArrayD<f64>),
    Branch(BTreeMap<String, ParamNode>),
}

/// A tree of named parameter arrays addressed by `/`-separated paths.
///
/// Branches use `BTreeMap`, so [`flatten`](ParamTree::flatten) emits keys
/// in a deterministic sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTree {
    root: BTreeMap<String, ParamNode>,
}

impl ParamTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn segments(path: &str) -> Result<Vec<&str>, ParamError> {
        let segs: Vec<&str> = path.split('/').collect();
        if segs.is_empty() || segs.iter().any(|s| s.is_empty()) {
            return Err(ParamError::EmptyPath);
        }
        Ok(segs)
    }

    /// Insert (or replace) the parameter at `path`, creating intermediate
    /// branches as needed.
    ///
    /// Fails when the path runs through an existing leaf or addresses an
    /// existing subtree.
    pub fn insert(&mut self, path: &str, value: ArrayD<f64>) -> Result<(), ParamError> {
        let segs = Self::segments(path)?;
        let (last, prefix) = segs.split_last().ok_or(ParamError::EmptyPath)?;

        let mut map = &mut self.root;
        let mut walked = Vec::new();
        for seg in prefix {
            walked.push(*seg);
            let node = map
                .entry(seg.to_string())
                .or_insert_with(|| ParamNode::Branch(BTreeMap::new()));
            match node {
                ParamNode::Branch(children) => map = children,
                ParamNode::Leaf(_) => {
                    return Err(ParamError::LeafConflict {
                        path: walked.join("/"),
                    })
                }
            }
        }

        match map.get(*last) {
            Some(ParamNode::Branch(_)) => Err(ParamError::NotALeaf {
                path: path.to_string(),
            }),
            _ => {
                map.insert(last.to_string(), ParamNode::Leaf(value));
                Ok(())
            }
        }
    }

    fn find(&self, path: &str) -> Option<&ParamNode> {
        let segs = Self::segments(path).ok()?;
        let mut node: Option<&ParamNode> = None;
        let mut map = &self.root;
        for seg in segs {
            node = map.get(seg);
            match node {
                Some(ParamNode::Branch(children)) => map = children,
                Some(ParamNode::Leaf(_)) => map = &EMPTY,
                None => return None,
            }
        }
        node
    }

    fn find_leaf_mut(&mut self, path: &str) -> Result<&mut ArrayD<f64>, ParamError> {
        let segs = Self::segments(path)?;
        let (last, prefix) = segs.split_last().ok_or(ParamError::EmptyPath)?;

        let mut map = &mut self.root;
        for seg in prefix {
            match map.get_mut(*seg) {
                Some(ParamNode::Branch(children)) => map = children,
                _ => {
                    return Err(ParamError::Missing {
                        path: path.to_string(),
                    })
                }
            }
        }
        match map.get_mut(*last) {
            Some(ParamNode::Leaf(arr)) => Ok(arr),
            Some(ParamNode::Branch(_)) => Err(ParamError::NotALeaf {
                path: path.to_string(),
            }),
            None => Err(ParamError::Missing {
                path: path.to_string(),
            }),
        }
    }

    /// Look up the parameter at `path`, if any.
    pub fn get(&self, path: &str) -> Option<&ArrayD<f64>> {
        match self.find(path) {
            Some(ParamNode::Leaf(arr)) => Some(arr),
            _ => None,
        }
    }

    /// Whether any node (leaf or subtree) exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Number of parameter arrays in the tree.
    pub fn len(&self) -> usize {
        fn count(map: &BTreeMap<String, ParamNode>) -> usize {
            map.values()
                .map(|n| match n {
                    ParamNode::Leaf(_) => 1,
                    ParamNode::Branch(children) => count(children),
                })
                .sum()
        }
        count(&self.root)
    }

    /// Whether the tree holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of scalar values across all parameters.
    pub fn num_values(&self) -> usize {
        self.flatten_refs().iter().map(|(_, a)| a.len()).sum()
    }

    fn flatten_refs(&self) -> Vec<(String, &ArrayD<f64>)> {
        fn walk<'a>(
            map: &'a BTreeMap<String, ParamNode>,
            prefix: &str,
            out: &mut Vec<(String, &'a ArrayD<f64>)>,
        ) {
            for (key, node) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}/{key}")
                };
                match node {
                    ParamNode::Leaf(arr) => out.push((path, arr)),
                    ParamNode::Branch(children) => walk(children, &path, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, "", &mut out);
        out
    }

    /// Flatten the tree into sorted `(path, array)` pairs.
    ///
    /// The inverse of [`from_flat`](ParamTree::from_flat).
    pub fn flatten(&self) -> Vec<(String, ArrayD<f64>)> {
        self.flatten_refs()
            .into_iter()
            .map(|(k, a)| (k, a.clone()))
            .collect()
    }

    /// Rebuild a tree from flat `(path, array)` pairs.
    pub fn from_flat(
        pairs: impl IntoIterator<Item = (String, ArrayD<f64>)>,
    ) -> Result<Self, ParamError> {
        let mut tree = Self::new();
        for (path, arr) in pairs {
            tree.insert(&path, arr)?;
        }
        Ok(tree)
    }

    /// Load flat pairs into an existing tree.
    ///
    /// Every pair must address an existing parameter of identical shape;
    /// a missing path or a shape mismatch fails the whole apply. Returns
    /// the number of parameters updated.
    pub fn apply(&mut self, pairs: &[(String, ArrayD<f64>)]) -> Result<usize, ParamError> {
        // Validate everything before mutating anything.
        for (path, arr) in pairs {
            let current = self
                .get(path)
                .ok_or_else(|| ParamError::Missing {
                    path: path.clone(),
                })?;
            if current.shape() != arr.shape() {
                return Err(ParamError::ShapeMismatch {
                    path: path.clone(),
                    expected: current.shape().to_vec(),
                    got: arr.shape().to_vec(),
                });
            }
        }
        for (path, arr) in pairs {
            *self.find_leaf_mut(path)? = arr.clone();
        }
        Ok(pairs.len())
    }
}

static EMPTY: BTreeMap<String, ParamNode> = BTreeMap::new();

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn arr(values: &[f64]) -> ArrayD<f64> {
        ArrayD::from_shape_vec(vec![values.len()], values.to_vec()).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let mut tree = ParamTree::new();
        tree.insert("model/fc1/weight", arr(&[1.0, 2.0])).unwrap();
        tree.insert("model/fc1/bias", arr(&[0.5])).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get("model/fc1/bias").unwrap()[[0]], 0.5);
        assert!(tree.get("model/fc2/weight").is_none());
        assert!(tree.contains("model/fc1"));
    }

    #[test]
    fn path_through_leaf_rejected() {
        let mut tree = ParamTree::new();
        tree.insert("w", arr(&[1.0])).unwrap();
        let err = tree.insert("w/nested", arr(&[2.0]));
        assert!(matches!(err, Err(ParamError::LeafConflict { .. })));
    }

    #[test]
    fn leaf_over_subtree_rejected() {
        let mut tree = ParamTree::new();
        tree.insert("m/w", arr(&[1.0])).unwrap();
        let err = tree.insert("m", arr(&[2.0]));
        assert!(matches!(err, Err(ParamError::NotALeaf { .. })));
    }

    #[test]
    fn flatten_unflatten_roundtrip() {
        let mut tree = ParamTree::new();
        tree.insert("net/layer1/weight", arr(&[1.0, 2.0, 3.0]))
            .unwrap();
        tree.insert("net/layer1/bias", arr(&[0.1])).unwrap();
        tree.insert("net/layer2/weight", arr(&[4.0])).unwrap();
        tree.insert("step", arr(&[7.0])).unwrap();

        let flat = tree.flatten();
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        // Sorted, deterministic order
        assert_eq!(
            keys,
            vec![
                "net/layer1/bias",
                "net/layer1/weight",
                "net/layer2/weight",
                "step"
            ]
        );

        let rebuilt = ParamTree::from_flat(flat).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn counts_leaves_and_values() {
        let mut tree = ParamTree::new();
        tree.insert("m/w", arr(&[1.0, 2.0, 3.0])).unwrap();
        tree.insert("m/b", arr(&[0.5])).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.num_values(), 4);
        assert!(!tree.is_empty());
    }

    #[test]
    fn apply_updates_matching_params() {
        let mut tree = ParamTree::new();
        tree.insert("m/w", arr(&[0.0, 0.0])).unwrap();
        let n = tree
            .apply(&[("m/w".to_string(), arr(&[1.5, -2.5]))])
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(tree.get("m/w").unwrap()[[1]], -2.5);
    }

    #[test]
    fn apply_rejects_missing_path() {
        let mut tree = ParamTree::new();
        tree.insert("m/w", arr(&[0.0])).unwrap();
        let err = tree.apply(&[("m/b".to_string(), arr(&[1.0]))]);
        assert!(matches!(err, Err(ParamError::Missing { .. })));
    }

    #[test]
    fn apply_rejects_shape_mismatch_without_partial_update() {
        let mut tree = ParamTree::new();
        tree.insert("m/w", arr(&[0.0, 0.0])).unwrap();
        tree.insert("m/b", arr(&[0.0])).unwrap();
        let err = tree.apply(&[
            ("m/w".to_string(), arr(&[9.0, 9.0])),
            ("m/b".to_string(), arr(&[1.0, 1.0])),
        ]);
        assert!(matches!(err, Err(ParamError::ShapeMismatch { .. })));
        // The valid first pair must not have been applied.
        assert_eq!(tree.get("m/w").unwrap()[[0]], 0.0);
    }
}
