use crate::collision::collision_pair::BodyPair;
use crate::collision::dynamic_tree::DynamicTree;
use crate::collision::spatial_grid::SpatialGrid;
use crate::core::BodyId;
use crate::math::Aabb;

/// Trait for broad-phase collision detection algorithms
pub trait BroadPhase {
    /// Synchronizes the broad-phase with the current body AABBs. The
    /// slice holds one entry per body slot, in body id order.
    fn update(&mut self, bodies: &[(BodyId, Aabb)]);

    /// Appends all candidate collision pairs, each exactly once, in a
    /// deterministic order
    fn collect_pairs(&mut self, out: &mut Vec<BodyPair>);
}

/// Dynamic AABB tree broad-phase.
///
/// Keeps one tree proxy per body. Proxies store an AABB fattened by a
/// skin margin; a proxy is only reinserted when the body's tight AABB
/// escapes the stored fat one, so small motions cost nothing.
pub struct TreeBroadPhase {
    tree: DynamicTree,
    skin: f32,

    /// Leaf id per body slot
    proxies: Vec<i32>,

    /// Stored fattened AABB per body slot
    fat_aabbs: Vec<Aabb>,
}

impl TreeBroadPhase {
    /// Creates a new tree broad-phase with the given node capacity and
    /// fattening skin
    pub fn new(capacity: usize, skin: f32) -> Self {
        Self {
            tree: DynamicTree::new(capacity),
            skin,
            proxies: Vec::new(),
            fat_aabbs: Vec::new(),
        }
    }

    /// Returns a reference to the underlying tree
    pub fn tree(&self) -> &DynamicTree {
        &self.tree
    }
}

impl BroadPhase for TreeBroadPhase {
    fn update(&mut self, bodies: &[(BodyId, Aabb)]) {
        for (slot, &(body_id, tight)) in bodies.iter().enumerate() {
            if slot < self.proxies.len() {
                // Fast path: the fat AABB still contains the tight one
                if self.fat_aabbs[slot].contains(&tight) {
                    continue;
                }

                let fat = tight.fatten(self.skin);
                self.proxies[slot] = self.tree.update_leaf(self.proxies[slot], fat);
                self.fat_aabbs[slot] = fat;
            } else {
                let fat = tight.fatten(self.skin);
                self.proxies.push(self.tree.insert_leaf(body_id, fat));
                self.fat_aabbs.push(fat);
            }
        }

        // Destroyed bodies leave trailing proxies behind
        while self.proxies.len() > bodies.len() {
            let leaf = self.proxies.pop().unwrap();
            self.fat_aabbs.pop();
            self.tree.remove_leaf(leaf);
        }
    }

    fn collect_pairs(&mut self, out: &mut Vec<BodyPair>) {
        self.tree.query_pairs(out);
    }
}

/// Uniform grid broad-phase over a fixed world rectangle.
///
/// Rebuilt from scratch every tick. Candidate pairs from shared cells
/// are filtered against the actual AABBs before being reported, so the
/// grid never emits a pair whose boxes do not overlap.
pub struct GridBroadPhase {
    grid: SpatialGrid,

    /// Tight AABB per body slot, for the overlap filter
    aabbs: Vec<Aabb>,

    /// Scratch buffer for raw in-cell pairs
    scratch: Vec<BodyPair>,
}

impl GridBroadPhase {
    /// Creates a new grid broad-phase over the given bounds
    pub fn new(bounds: Aabb, cell_size: f32) -> Self {
        Self {
            grid: SpatialGrid::new(bounds, cell_size),
            aabbs: Vec::new(),
            scratch: Vec::new(),
        }
    }
}

impl BroadPhase for GridBroadPhase {
    fn update(&mut self, bodies: &[(BodyId, Aabb)]) {
        self.grid.clear();
        self.aabbs.clear();

        for &(body_id, aabb) in bodies {
            self.grid.insert(body_id, &aabb);
            self.aabbs.push(aabb);
        }
    }

    fn collect_pairs(&mut self, out: &mut Vec<BodyPair>) {
        self.scratch.clear();
        self.grid.collect_pairs(&mut self.scratch);

        for pair in &self.scratch {
            let aabb_a = &self.aabbs[pair.body_a as usize];
            let aabb_b = &self.aabbs[pair.body_b as usize];

            if aabb_a.overlaps(aabb_b) {
                out.push(*pair);
            }
        }
    }
}
