//! Per-frame passes run over a [`Scene`](crate::scene::Scene).

pub mod transform_propagation;

pub use transform_propagation::{resolve_transforms, ResolveStats};
