use crate::collision::collision_pair::BodyPair;
use crate::core::BodyId;
use crate::math::Aabb;

/// Sentinel index meaning "no node"
pub const NULL_NODE: i32 = -1;

/// Body id stored on internal nodes, which have no body
pub const INTERNAL_NODE: BodyId = u32::MAX;

/// A node in the dynamic AABB tree.
///
/// Nodes live in an arena addressed by signed indices so parent/child
/// links form no ownership cycles and the whole array can be relocated
/// on growth. Leaves carry a body id and height 0; internal nodes carry
/// the union of their children's AABBs. Free nodes have height -1 and
/// are threaded through `next`.
#[derive(Debug, Clone, Copy)]
pub struct TreeNode {
    /// The node's AABB; for internal nodes, the union of the children
    pub aabb: Aabb,

    /// The body this leaf represents, or `INTERNAL_NODE`
    pub body_id: BodyId,

    /// Parent node index, or `NULL_NODE` for the root
    pub parent: i32,

    /// Left child index
    pub left: i32,

    /// Right child index
    pub right: i32,

    /// Height above the leaves; 0 for leaves, -1 for free nodes
    pub height: i32,

    /// Next node in the free list when unallocated
    pub next: i32,
}

impl TreeNode {
    fn empty() -> Self {
        Self {
            aabb: Aabb::new(crate::math::Vector2::zero(), crate::math::Vector2::zero()),
            body_id: INTERNAL_NODE,
            parent: NULL_NODE,
            left: NULL_NODE,
            right: NULL_NODE,
            height: -1,
            next: NULL_NODE,
        }
    }

    /// Returns whether this node is a leaf
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.right == NULL_NODE
    }
}

/// A dynamic AABB tree broadphase structure.
///
/// Answers "which leaves might overlap this AABB?" in expected
/// O(log n) while supporting cheap insertion, removal and movement of
/// leaves. The tree is kept AVL-balanced: after every mutation the
/// heights of any node's children differ by at most one.
///
/// Node indices other than leaf ids are unstable across mutations; leaf
/// ids returned by [`DynamicTree::insert_leaf`] are the supported handle.
#[derive(Debug)]
pub struct DynamicTree {
    nodes: Vec<TreeNode>,
    root: i32,
    node_count: i32,
    free_list: i32,
}

impl DynamicTree {
    /// Creates a new tree with the given initial node capacity
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(2);
        let mut nodes = vec![TreeNode::empty(); capacity];

        // Thread every node onto the free list
        for i in 0..capacity - 1 {
            nodes[i].next = (i + 1) as i32;
        }
        nodes[capacity - 1].next = NULL_NODE;

        Self {
            nodes,
            root: NULL_NODE,
            node_count: 0,
            free_list: 0,
        }
    }

    /// Returns the root node index, or `None` when the tree is empty
    pub fn root(&self) -> Option<i32> {
        if self.root == NULL_NODE {
            None
        } else {
            Some(self.root)
        }
    }

    /// Returns the number of allocated nodes
    pub fn node_count(&self) -> i32 {
        self.node_count
    }

    /// Returns the current node capacity
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a reference to a node by index
    pub fn node(&self, index: i32) -> &TreeNode {
        &self.nodes[index as usize]
    }

    /// Returns the number of nodes on the free list
    pub fn free_count(&self) -> usize {
        let mut count = 0;
        let mut index = self.free_list;
        while index != NULL_NODE {
            count += 1;
            index = self.nodes[index as usize].next;
        }
        count
    }

    fn allocate_node(&mut self) -> i32 {
        if self.free_list == NULL_NODE {
            // Double capacity and thread the new nodes onto the free list
            let old_capacity = self.nodes.len();
            let new_capacity = old_capacity * 2;
            self.nodes.resize(new_capacity, TreeNode::empty());

            for i in old_capacity..new_capacity - 1 {
                self.nodes[i].next = (i + 1) as i32;
                self.nodes[i].height = -1;
            }
            self.nodes[new_capacity - 1].next = NULL_NODE;
            self.nodes[new_capacity - 1].height = -1;
            self.free_list = old_capacity as i32;
        }

        let node_id = self.free_list;
        let node = &mut self.nodes[node_id as usize];
        self.free_list = node.next;
        node.parent = NULL_NODE;
        node.left = NULL_NODE;
        node.right = NULL_NODE;
        node.height = 0;
        node.body_id = INTERNAL_NODE;
        self.node_count += 1;
        node_id
    }

    fn free_node(&mut self, node_id: i32) {
        self.nodes[node_id as usize].next = self.free_list;
        self.nodes[node_id as usize].height = -1;
        self.free_list = node_id;
        self.node_count -= 1;
    }

    /// Inserts a leaf for the given body and returns its id
    pub fn insert_leaf(&mut self, body_id: BodyId, aabb: Aabb) -> i32 {
        let leaf_id = self.allocate_node();
        self.nodes[leaf_id as usize].aabb = aabb;
        self.nodes[leaf_id as usize].body_id = body_id;
        self.nodes[leaf_id as usize].height = 0;

        if self.root == NULL_NODE {
            self.root = leaf_id;
            return leaf_id;
        }

        // Descend from the root towards the cheapest sibling. At each
        // internal node, compare the cost of making the node itself the
        // sibling against the cost of pushing the new leaf into either
        // child, where descending inherits the area growth of every
        // enlarged ancestor.
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let left = self.nodes[index as usize].left;
            let right = self.nodes[index as usize].right;

            let area = self.nodes[index as usize].aabb.area();
            let combined_area = self.nodes[index as usize].aabb.union(&aabb).area();

            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost_left = self.descend_cost(left, &aabb, inheritance_cost);
            let cost_right = self.descend_cost(right, &aabb, inheritance_cost);

            if cost < cost_left && cost < cost_right {
                break;
            }

            index = if cost_left < cost_right { left } else { right };
        }

        let sibling = index;

        // Splice a new internal parent around {sibling, new leaf}
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node();
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].aabb = self.nodes[sibling as usize].aabb.union(&aabb);
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;
        self.nodes[new_parent as usize].left = sibling;
        self.nodes[new_parent as usize].right = leaf_id;
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf_id as usize].parent = new_parent;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].left == sibling {
                self.nodes[old_parent as usize].left = new_parent;
            } else {
                self.nodes[old_parent as usize].right = new_parent;
            }
        } else {
            self.root = new_parent;
        }

        // Walk back to the root, rebalancing and refreshing AABB + height
        let mut index = self.nodes[leaf_id as usize].parent;
        while index != NULL_NODE {
            index = self.balance(index);
            self.refresh(index);
            index = self.nodes[index as usize].parent;
        }

        leaf_id
    }

    /// Cost of descending the new AABB into the given child
    fn descend_cost(&self, child: i32, aabb: &Aabb, inheritance_cost: f32) -> f32 {
        let child_node = &self.nodes[child as usize];
        let new_area = child_node.aabb.union(aabb).area();

        if child_node.is_leaf() {
            new_area + inheritance_cost
        } else {
            (new_area - child_node.aabb.area()) + inheritance_cost
        }
    }

    /// Refreshes a node's height and AABB from its children
    fn refresh(&mut self, index: i32) {
        let left = self.nodes[index as usize].left;
        let right = self.nodes[index as usize].right;

        self.nodes[index as usize].height = 1 + self.nodes[left as usize]
            .height
            .max(self.nodes[right as usize].height);
        self.nodes[index as usize].aabb = self.nodes[left as usize]
            .aabb
            .union(&self.nodes[right as usize].aabb);
    }

    /// Removes a leaf from the tree, returning its node to the free list
    pub fn remove_leaf(&mut self, leaf_id: i32) {
        if leaf_id == self.root {
            self.root = NULL_NODE;
            self.free_node(leaf_id);
            return;
        }

        let parent = self.nodes[leaf_id as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].left == leaf_id {
            self.nodes[parent as usize].right
        } else {
            self.nodes[parent as usize].left
        };

        if grand_parent != NULL_NODE {
            // Promote the sibling into the parent's slot
            if self.nodes[grand_parent as usize].left == parent {
                self.nodes[grand_parent as usize].left = sibling;
            } else {
                self.nodes[grand_parent as usize].right = sibling;
            }
            self.nodes[sibling as usize].parent = grand_parent;
            self.free_node(parent);

            let mut index = grand_parent;
            while index != NULL_NODE {
                index = self.balance(index);
                self.refresh(index);
                index = self.nodes[index as usize].parent;
            }
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.free_node(parent);
        }

        self.free_node(leaf_id);
    }

    /// Moves a leaf to a new AABB, returning the new leaf id
    pub fn update_leaf(&mut self, leaf_id: i32, aabb: Aabb) -> i32 {
        let body_id = self.nodes[leaf_id as usize].body_id;
        self.remove_leaf(leaf_id);
        self.insert_leaf(body_id, aabb)
    }

    /// Balances the subtree at the given index, rotating the taller
    /// child up when the height difference reaches two. Returns the
    /// index of the subtree's new top node.
    fn balance(&mut self, i_a: i32) -> i32 {
        if i_a == NULL_NODE || self.nodes[i_a as usize].height < 2 {
            return i_a;
        }

        let i_b = self.nodes[i_a as usize].left;
        let i_c = self.nodes[i_a as usize].right;
        let balance_factor =
            self.nodes[i_c as usize].height - self.nodes[i_b as usize].height;

        // Rotate C up
        if balance_factor > 1 {
            let i_f = self.nodes[i_c as usize].left;
            let i_g = self.nodes[i_c as usize].right;

            // Swap A and C
            self.nodes[i_c as usize].left = i_a;
            self.nodes[i_c as usize].parent = self.nodes[i_a as usize].parent;
            self.nodes[i_a as usize].parent = i_c;

            // A's old parent should point to C
            let c_parent = self.nodes[i_c as usize].parent;
            if c_parent != NULL_NODE {
                if self.nodes[c_parent as usize].left == i_a {
                    self.nodes[c_parent as usize].left = i_c;
                } else {
                    self.nodes[c_parent as usize].right = i_c;
                }
            } else {
                self.root = i_c;
            }

            // The taller grandchild stays high
            if self.nodes[i_f as usize].height > self.nodes[i_g as usize].height {
                self.nodes[i_c as usize].right = i_f;
                self.nodes[i_a as usize].right = i_g;
                self.nodes[i_g as usize].parent = i_a;

                self.nodes[i_a as usize].aabb = self.nodes[i_b as usize]
                    .aabb
                    .union(&self.nodes[i_g as usize].aabb);
                self.nodes[i_c as usize].aabb = self.nodes[i_a as usize]
                    .aabb
                    .union(&self.nodes[i_f as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_b as usize]
                    .height
                    .max(self.nodes[i_g as usize].height);
                self.nodes[i_c as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_f as usize].height);
            } else {
                self.nodes[i_c as usize].right = i_g;
                self.nodes[i_a as usize].right = i_f;
                self.nodes[i_f as usize].parent = i_a;

                self.nodes[i_a as usize].aabb = self.nodes[i_b as usize]
                    .aabb
                    .union(&self.nodes[i_f as usize].aabb);
                self.nodes[i_c as usize].aabb = self.nodes[i_a as usize]
                    .aabb
                    .union(&self.nodes[i_g as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_b as usize]
                    .height
                    .max(self.nodes[i_f as usize].height);
                self.nodes[i_c as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_g as usize].height);
            }

            return i_c;
        }

        // Rotate B up
        if balance_factor < -1 {
            let i_d = self.nodes[i_b as usize].left;
            let i_e = self.nodes[i_b as usize].right;

            self.nodes[i_b as usize].left = i_a;
            self.nodes[i_b as usize].parent = self.nodes[i_a as usize].parent;
            self.nodes[i_a as usize].parent = i_b;

            let b_parent = self.nodes[i_b as usize].parent;
            if b_parent != NULL_NODE {
                if self.nodes[b_parent as usize].left == i_a {
                    self.nodes[b_parent as usize].left = i_b;
                } else {
                    self.nodes[b_parent as usize].right = i_b;
                }
            } else {
                self.root = i_b;
            }

            if self.nodes[i_d as usize].height > self.nodes[i_e as usize].height {
                self.nodes[i_b as usize].right = i_d;
                self.nodes[i_a as usize].left = i_e;
                self.nodes[i_e as usize].parent = i_a;

                self.nodes[i_a as usize].aabb = self.nodes[i_c as usize]
                    .aabb
                    .union(&self.nodes[i_e as usize].aabb);
                self.nodes[i_b as usize].aabb = self.nodes[i_a as usize]
                    .aabb
                    .union(&self.nodes[i_d as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_c as usize]
                    .height
                    .max(self.nodes[i_e as usize].height);
                self.nodes[i_b as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_d as usize].height);
            } else {
                self.nodes[i_b as usize].right = i_e;
                self.nodes[i_a as usize].left = i_d;
                self.nodes[i_d as usize].parent = i_a;

                self.nodes[i_a as usize].aabb = self.nodes[i_c as usize]
                    .aabb
                    .union(&self.nodes[i_d as usize].aabb);
                self.nodes[i_b as usize].aabb = self.nodes[i_a as usize]
                    .aabb
                    .union(&self.nodes[i_e as usize].aabb);

                self.nodes[i_a as usize].height = 1 + self.nodes[i_c as usize]
                    .height
                    .max(self.nodes[i_d as usize].height);
                self.nodes[i_b as usize].height = 1 + self.nodes[i_a as usize]
                    .height
                    .max(self.nodes[i_e as usize].height);
            }

            return i_b;
        }

        i_a
    }

    /// Collects every unordered pair of leaves whose AABBs overlap.
    ///
    /// Leaves are enumerated in depth-first order; for each leaf the
    /// tree is descended and a pair is emitted only when the partner's
    /// node index is strictly greater, so each pair appears exactly once
    /// without a dedup set.
    pub fn query_pairs(&self, out: &mut Vec<BodyPair>) {
        if self.root == NULL_NODE {
            return;
        }

        let mut leaves = Vec::new();
        let mut stack = vec![self.root];

        while let Some(current) = stack.pop() {
            let node = &self.nodes[current as usize];
            if node.is_leaf() {
                leaves.push(current);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }

        for &leaf_a in &leaves {
            let aabb_a = self.nodes[leaf_a as usize].aabb;

            stack.clear();
            stack.push(self.root);

            while let Some(current) = stack.pop() {
                let node = &self.nodes[current as usize];

                if !node.aabb.overlaps(&aabb_a) {
                    continue;
                }

                if node.is_leaf() {
                    if current > leaf_a {
                        out.push(BodyPair::new(
                            self.nodes[leaf_a as usize].body_id,
                            node.body_id,
                        ));
                    }
                } else {
                    stack.push(node.left);
                    stack.push(node.right);
                }
            }
        }
    }

    /// Collects the body ids of all leaves overlapping the given AABB
    pub fn query(&self, aabb: &Aabb, out: &mut Vec<BodyId>) {
        if self.root == NULL_NODE {
            return;
        }

        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current as usize];

            if !node.aabb.overlaps(aabb) {
                continue;
            }

            if node.is_leaf() {
                out.push(node.body_id);
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }

    /// Checks the structural invariants of the whole tree, panicking
    /// with a description of the first violation found.
    ///
    /// Verified: parent links are consistent, every internal node's AABB
    /// is the union of its children's, heights are 1 + max(child
    /// heights), child heights differ by at most one, and free nodes
    /// carry height -1.
    pub fn validate(&self) {
        if self.root != NULL_NODE {
            assert_eq!(
                self.nodes[self.root as usize].parent, NULL_NODE,
                "root must have no parent"
            );
            self.validate_subtree(self.root);
        }

        let mut index = self.free_list;
        while index != NULL_NODE {
            assert_eq!(
                self.nodes[index as usize].height, -1,
                "free node {} must have height -1",
                index
            );
            index = self.nodes[index as usize].next;
        }
    }

    fn validate_subtree(&self, index: i32) {
        let node = &self.nodes[index as usize];

        if node.is_leaf() {
            assert_eq!(node.height, 0, "leaf {} must have height 0", index);
            assert_ne!(node.body_id, INTERNAL_NODE, "leaf {} must carry a body", index);
            return;
        }

        let left = node.left;
        let right = node.right;
        assert_eq!(
            self.nodes[left as usize].parent, index,
            "left child of {} has a stale parent link",
            index
        );
        assert_eq!(
            self.nodes[right as usize].parent, index,
            "right child of {} has a stale parent link",
            index
        );

        let left_node = &self.nodes[left as usize];
        let right_node = &self.nodes[right as usize];

        assert_eq!(
            node.height,
            1 + left_node.height.max(right_node.height),
            "node {} has a stale height",
            index
        );
        assert!(
            (left_node.height - right_node.height).abs() <= 1,
            "node {} violates the balance invariant",
            index
        );

        let union = left_node.aabb.union(&right_node.aabb);
        assert_eq!(
            node.aabb, union,
            "node {} AABB is not the union of its children",
            index
        );

        self.validate_subtree(left);
        self.validate_subtree(right);
    }
}
