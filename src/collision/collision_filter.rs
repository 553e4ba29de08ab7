use bitflags::bitflags;
use crate::core::BodyId;

bitflags! {
    /// A bit mask representing a collision group
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CollisionGroup: u32 {
        /// Default group (collides with everything)
        const DEFAULT = 0x0001;

        /// Static world geometry
        const WORLD = 0x0002;

        /// Player-controlled objects
        const PLAYER = 0x0004;

        /// Projectiles
        const PROJECTILE = 0x0008;

        /// Debris with simplified interactions
        const DEBRIS = 0x0010;

        /// All groups
        const ALL = 0xFFFF_FFFF;
    }
}

impl Default for CollisionGroup {
    fn default() -> Self {
        CollisionGroup::DEFAULT
    }
}

/// Type alias for a collision mask (what groups a body collides with)
pub type CollisionMask = CollisionGroup;

/// A filter deciding which body pairs the narrowphase may test.
///
/// A collides with B when A's mask includes B's group and B's mask
/// includes A's group. Bodies default to the DEFAULT group and the ALL
/// mask, so everything collides unless the host narrows it.
#[derive(Debug, Default)]
pub struct GroupMaskFilter {
    /// The collision group for each body, indexed by body id
    groups: Vec<CollisionGroup>,

    /// The collision mask for each body, indexed by body id
    masks: Vec<CollisionMask>,
}

impl GroupMaskFilter {
    /// Creates a new group/mask collision filter
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            masks: Vec::new(),
        }
    }

    /// Sets the collision group for a body
    pub fn set_group(&mut self, body: BodyId, group: CollisionGroup) {
        let index = body as usize;

        if index >= self.groups.len() {
            self.groups.resize(index + 1, CollisionGroup::DEFAULT);
        }

        self.groups[index] = group;
    }

    /// Sets the collision mask for a body
    pub fn set_mask(&mut self, body: BodyId, mask: CollisionMask) {
        let index = body as usize;

        if index >= self.masks.len() {
            self.masks.resize(index + 1, CollisionMask::ALL);
        }

        self.masks[index] = mask;
    }

    /// Gets the collision group for a body
    pub fn group(&self, body: BodyId) -> CollisionGroup {
        self.groups
            .get(body as usize)
            .copied()
            .unwrap_or(CollisionGroup::DEFAULT)
    }

    /// Gets the collision mask for a body
    pub fn mask(&self, body: BodyId) -> CollisionMask {
        self.masks
            .get(body as usize)
            .copied()
            .unwrap_or(CollisionMask::ALL)
    }

    /// Returns whether the two bodies should be tested for collision
    pub fn should_collide(&self, body_a: BodyId, body_b: BodyId) -> bool {
        self.group(body_a).intersects(self.mask(body_b))
            && self.group(body_b).intersects(self.mask(body_a))
    }

    /// Removes the filter entries for a body that was swap-removed,
    /// moving the last body's entries into its slot
    pub fn swap_remove(&mut self, body: BodyId) {
        let index = body as usize;

        if index < self.groups.len() {
            self.groups.swap_remove(index);
        }
        if index < self.masks.len() {
            self.masks.swap_remove(index);
        }
    }
}
