mod collision_pair;
mod collision_filter;
mod contact_manifold;
mod dynamic_tree;
mod spatial_grid;
mod broad_phase;
mod narrow_phase;
mod contact_solver;

pub use self::collision_pair::BodyPair;
pub use self::collision_filter::{CollisionGroup, CollisionMask, GroupMaskFilter};
pub use self::contact_manifold::{ContactManifold, ContactPoint, MAX_CONTACT_POINTS};
pub use self::dynamic_tree::{DynamicTree, TreeNode, INTERNAL_NODE, NULL_NODE};
pub use self::spatial_grid::SpatialGrid;
pub use self::broad_phase::{BroadPhase, GridBroadPhase, TreeBroadPhase};
pub use self::narrow_phase::{collide, detect_collisions};
pub use self::contact_solver::SequentialImpulseSolver;
