//! Exact tree edit distance under the unit cost model.
//!
//! Trees are first indexed in postorder (labels, leftmost-leaf descendants,
//! keyroots), then the distance is computed with the keyroot-by-keyroot
//! forest DP. Insertion and deletion cost 1; renaming costs 1 unless the
//! interned label ids are equal. The only label query the algorithm makes is
//! integer equality, so trees compared against each other must have been
//! parsed through the same [`LabelDictionary`](crate::tree::LabelDictionary).

use std::collections::HashMap;

use crate::tree::{LabelId, Tree, TreeNode};

/// Postorder index of a tree prepared for the edit-distance DP.
pub struct TreeIndex {
    /// Node labels in postorder.
    labels: Vec<LabelId>,
    /// Postorder position of each node's leftmost leaf descendant.
    lld: Vec<usize>,
    /// Keyroots in increasing postorder position.
    keyroots: Vec<usize>,
}

impl TreeIndex {
    pub fn new(tree: &Tree) -> Self {
        let mut labels = Vec::new();
        let mut lld = Vec::new();
        if let Some(root) = &tree.root {
            index_node(root, &mut labels, &mut lld);
        }

        // A keyroot is the last (highest postorder) node sharing its
        // leftmost leaf, i.e. a node with a left sibling, plus the root.
        let mut last_for_lld: HashMap<usize, usize> = HashMap::new();
        for (pos, &leaf) in lld.iter().enumerate() {
            last_for_lld.insert(leaf, pos);
        }
        let mut keyroots: Vec<usize> = last_for_lld.into_values().collect();
        keyroots.sort_unstable();

        Self {
            labels,
            lld,
            keyroots,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// Appends the subtree in postorder; returns the postorder position of its
// leftmost leaf.
fn index_node(node: &TreeNode, labels: &mut Vec<LabelId>, lld: &mut Vec<usize>) -> usize {
    let mut leftmost = None;
    for child in &node.children {
        let child_leftmost = index_node(child, labels, lld);
        leftmost.get_or_insert(child_leftmost);
    }
    let position = labels.len();
    let leftmost = leftmost.unwrap_or(position);
    labels.push(node.label);
    lld.push(leftmost);
    leftmost
}

/// Exact edit distance between two indexed trees.
pub fn tree_edit_distance(t1: &TreeIndex, t2: &TreeIndex) -> usize {
    let n = t1.len();
    let m = t2.len();
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut tree_dist = vec![vec![0usize; m]; n];
    // Forest-distance scratch, reused across keyroot pairs.
    let mut fd = vec![vec![0usize; m + 1]; n + 1];

    for &i in &t1.keyroots {
        for &j in &t2.keyroots {
            let li = t1.lld[i];
            let lj = t2.lld[j];
            let rows = i - li + 1;
            let cols = j - lj + 1;

            fd[0][0] = 0;
            for x in 1..=rows {
                fd[x][0] = fd[x - 1][0] + 1;
            }
            for y in 1..=cols {
                fd[0][y] = fd[0][y - 1] + 1;
            }

            for x in 1..=rows {
                let ni = li + x - 1;
                for y in 1..=cols {
                    let nj = lj + y - 1;
                    if t1.lld[ni] == li && t2.lld[nj] == lj {
                        // Both prefixes are whole subtrees: the rename case
                        // applies and the result doubles as a tree distance.
                        let rename = usize::from(t1.labels[ni] != t2.labels[nj]);
                        let dist = (fd[x - 1][y] + 1)
                            .min(fd[x][y - 1] + 1)
                            .min(fd[x - 1][y - 1] + rename);
                        fd[x][y] = dist;
                        tree_dist[ni][nj] = dist;
                    } else {
                        let fx = t1.lld[ni] - li;
                        let fy = t2.lld[nj] - lj;
                        fd[x][y] = (fd[x - 1][y] + 1)
                            .min(fd[x][y - 1] + 1)
                            .min(fd[fx][fy] + tree_dist[ni][nj]);
                    }
                }
            }
        }
    }

    tree_dist[n - 1][m - 1]
}
