/// Numeric helpers for synthesizing 2D Gaussian "receptive field" stimuli,
/// sampling random points in geometric domains, and assembling image
/// mosaics for visualization.
///
/// Every function is a pure transform over small in-memory arrays; the
/// random generators take an explicit `rng` so callers control seeding.
pub mod functions;

pub use crate::functions::*;
