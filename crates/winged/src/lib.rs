//! Winged-edge mesh kernel.
//!
//! This crate provides the data side of the sculpting kernel:
//! - Pooled vertex/edge/face storage addressed by slot, plus process-wide
//!   [`Identifier`]s that survive slot reuse
//! - Rotation iterators and topology queries over the winged-edge links
//! - A loose octree over faces with ray, sphere and plane queries
//! - The staged [`AffectedFaces`] set used to batch post-edit work
//! - Import from indexed triangle soups and a few primitive shapes
//! - Manifold validation and byte views of the render buffers
//!
//! # Architecture
//!
//! [`WingedMesh`] is the single owner of elements, buffers and the octree.
//! Its mutators are raw: they neither record undo information nor keep the
//! render buffers in sync. Topology operators in the sculpting crate
//! combine them into consistent, undoable edits.

pub mod affected;
pub mod definition;
pub mod element;
pub mod intersection;
pub mod mesh;
pub mod octree;
pub mod pool;
pub mod primitive;
pub mod render;
pub mod types;

pub use affected::AffectedFaces;
pub use definition::MeshDefinition;
pub use element::{Edge, EdgeGeometry, Face, Vertex};
pub use mesh::{ManifoldError, MeshStatistics, Pivot, Rotation, WingedMesh};
pub use octree::{NodeId, NodeRef, Octree, OctreeHit, OctreeStatistics};
pub use primitive::{Aabb, Plane, Ray, Sphere, Triangle};
pub use render::RenderVertex;
pub use types::{EdgeId, ElementRef, FaceGradient, FaceId, Identifier, SlotId, VertexId, WingedError};
