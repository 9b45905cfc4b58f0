//! Shared configuration for the sculpting kernel
//!
//! This crate is the single source of truth for the tunable constants of the
//! mesh kernel: degeneracy thresholds, octree scale bands, brush defaults and
//! the post-processing passes that run after every sculpt gesture.
//!
//! Everything here is plain data. Loading configuration from files is left to
//! the application; the kernel only receives a [`KernelConfig`] value.

use serde::{Deserialize, Serialize};

/// Default geometric epsilon (minimal triangle altitude, distance tolerances)
pub const DEFAULT_EPSILON: f32 = 1.0e-4;

/// Default fraction of a node width below which a face descends into a child
pub const DEFAULT_RELATIVE_MIN_FACE_EXTENT: f32 = 0.1;

/// Default scale applied to octree node bounds during queries
pub const DEFAULT_LOOSE_FACTOR: f32 = 2.0;

/// Valence above which a vertex is treated as a pole during domain extension
pub const DEFAULT_POLE_VALENCE: u32 = 9;

/// Errors reported by [`KernelConfig::validate`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("relative_min_face_extent must be smaller than 0.5, got {0}")]
    FaceExtentTooLarge(f32),
}

/// Geometric tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Faces with an altitude below this are degenerated (default: 1e-4)
    pub epsilon: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Configuration of the loose face octree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctreeConfig {
    /// A face is pushed into a child node while its extent is at most
    /// `width * relative_min_face_extent` (default: 0.1)
    pub relative_min_face_extent: f32,
    /// Node bounds are scaled by this factor for ray and sphere tests (default: 2.0)
    pub loose_factor: f32,
    /// Padding added to the root width when the root is set up from a
    /// single face (default: 1e-4)
    pub root_padding: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            relative_min_face_extent: DEFAULT_RELATIVE_MIN_FACE_EXTENT,
            loose_factor: DEFAULT_LOOSE_FACTOR,
            root_padding: DEFAULT_EPSILON,
        }
    }
}

/// Defaults for the carve brush.
///
/// Values are configurable and should not be treated as magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarveConfig {
    /// Brush radius in world units (default: 0.3)
    pub radius: f32,
    /// Peak displacement as a fraction of the radius (default: 0.05)
    pub intensity_factor: f32,
    /// Radius of full intensity as a fraction of the radius (default: 0.5)
    pub inner_radius_factor: f32,
    /// Minimum stroke advance, as a fraction of the radius, before a new dab
    /// is applied (default: 0.3)
    pub step_width_factor: f32,
    /// Detail level in [0, 1); edges longer than
    /// `4/3 * (1 - detail_factor) * radius` are subdivided (default: 0.75)
    pub detail_factor: f32,
    /// Carve inwards instead of outwards (default: false)
    pub invert: bool,
    /// Use a linear instead of a smooth-step falloff (default: false)
    pub linear_falloff: bool,
    /// Subdivide long edges after carving (default: true)
    pub subdivide: bool,
    /// Relax edge valences after carving (default: true)
    pub relax: bool,
    /// Smooth the carved region after post-processing (default: true)
    pub smooth: bool,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            radius: 0.3,
            intensity_factor: 0.05,
            inner_radius_factor: 0.5,
            step_width_factor: 0.3,
            detail_factor: 0.75,
            invert: false,
            linear_falloff: false,
            subdivide: true,
            relax: true,
            smooth: true,
        }
    }
}

/// Defaults for the smoothing pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothConfig {
    /// Number of smoothing iterations per gesture (default: 1)
    pub iterations: u32,
    /// Relax edges before smoothing (default: true)
    pub relax_edges: bool,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            relax_edges: true,
        }
    }
}

/// Defaults for the edge-reduce pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReduceConfig {
    /// Edges shorter than `average length * intensity` are collapsed (default: 0.75)
    pub intensity: f32,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self { intensity: 0.75 }
    }
}

/// Configuration of the subdivision domain growth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubdivisionConfig {
    /// Faces touching a vertex with a higher valence join the domain (default: 9)
    pub pole_valence: u32,
    /// Number of one-ring extensions before the neighbourhood closure (default: 2)
    pub one_ring_extensions: u32,
}

impl Default for SubdivisionConfig {
    fn default() -> Self {
        Self {
            pole_valence: DEFAULT_POLE_VALENCE,
            one_ring_extensions: 2,
        }
    }
}

/// Complete kernel configuration, passed explicitly into meshes and actions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KernelConfig {
    pub geometry: GeometryConfig,
    pub octree: OctreeConfig,
    pub carve: CarveConfig,
    pub smooth: SmoothConfig,
    pub reduce: ReduceConfig,
    pub subdivision: SubdivisionConfig,
}

impl KernelConfig {
    /// Check every value against its admissible range
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("geometry.epsilon", self.geometry.epsilon)?;

        positive(
            "octree.relative_min_face_extent",
            self.octree.relative_min_face_extent,
        )?;
        if self.octree.relative_min_face_extent >= 0.5 {
            return Err(ConfigError::FaceExtentTooLarge(
                self.octree.relative_min_face_extent,
            ));
        }
        in_range("octree.loose_factor", self.octree.loose_factor, 1.0, 4.0)?;

        positive("carve.radius", self.carve.radius)?;
        in_range("carve.intensity_factor", self.carve.intensity_factor, 0.0, 1.0)?;
        in_range(
            "carve.inner_radius_factor",
            self.carve.inner_radius_factor,
            0.0,
            1.0,
        )?;
        in_range("carve.step_width_factor", self.carve.step_width_factor, 0.0, 1.0)?;
        in_range("carve.detail_factor", self.carve.detail_factor, 0.0, 0.99)?;

        in_range("reduce.intensity", self.reduce.intensity, 0.0, 1.0)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
