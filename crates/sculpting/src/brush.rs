//! Sculpt brush state and the carve displacement.
//!
//! The brush tracks where a stroke currently is and turns that position into
//! a domain of faces plus a displacement of the domain's vertices:
//!
//! ```text
//!   intensity
//!     ^
//!     |______
//!     |      '-.
//!     |         '.
//!     |           '-.___
//!     +--------+--------+--> distance to center
//!            inner    radius
//! ```
//!
//! Vertices within the inner radius move by the full intensity, the profile
//! falls to zero at the radius.

use std::collections::{BTreeSet, VecDeque};

use glam::Vec3;
use sculpt_config::CarveConfig;
use serde::{Deserialize, Serialize};
use tracing::trace;
use winged::intersection::sphere_triangle;
use winged::{AffectedFaces, FaceId, Sphere, VertexId, WingedMesh};

use crate::transaction::MeshEdit;

/// Falloff profile between the inner radius and the radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Falloff {
    /// Smoother step: `6x^5 - 15x^4 + 10x^3`, flat at both ends
    #[default]
    Smooth = 0,
    /// Linear ramp
    Linear = 1,
}

impl Falloff {
    /// Weight in [0, 1] of a point at `distance` from the brush center.
    ///
    /// If the inner radius reaches the radius the profile is a hard step.
    pub fn evaluate(self, distance: f32, inner_radius: f32, radius: f32, epsilon: f32) -> f32 {
        debug_assert!(inner_radius <= radius);
        if radius - inner_radius < epsilon {
            return if distance > radius { 0.0 } else { 1.0 };
        }
        let x = ((radius - distance) / (radius - inner_radius)).clamp(0.0, 1.0);
        match self {
            Falloff::Smooth => x * x * x * (x * (x * 6.0 - 15.0) + 10.0),
            Falloff::Linear => x,
        }
    }
}

/// What a dab does besides collecting its domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrushMode {
    /// Displace vertices along the sculpt direction
    #[default]
    Carve,
    /// Leave positions alone; post-processing smooths the domain
    Smooth,
    /// Leave positions alone; post-processing collapses short edges
    Reduce,
}

/// How the faces under the brush are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DomainQuery {
    /// Grow from the picked face across neighbours touching the sphere
    #[default]
    Neighborhood,
    /// Every face in the octree touching the sphere, connected or not
    Octree,
}

/// Sculpt brush.
#[derive(Debug, Clone, Default)]
pub struct SculptBrush {
    pub config: CarveConfig,
    pub mode: BrushMode,
    pub domain: DomainQuery,
    /// Apply dabs at the previous position instead of the current one
    pub use_last_position: bool,
    /// Fixed sculpt direction; `None` uses the average vertex normal
    direction: Option<Vec3>,
    /// `(last, current)` once the stroke has a position
    position: Option<(Vec3, Vec3)>,
}

impl SculptBrush {
    pub fn new(config: CarveConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: BrushMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    /// Peak displacement of a carve dab
    pub fn intensity(&self) -> f32 {
        self.config.intensity_factor * self.config.radius
    }

    pub fn inner_radius(&self) -> f32 {
        self.config.inner_radius_factor * self.config.radius
    }

    /// Edges longer than 4/3 of this are subdivided after a dab
    pub fn subdivision_threshold(&self) -> f32 {
        (1.0 - self.config.detail_factor) * self.config.radius
    }

    /// Distance the brush has to travel before the next dab
    pub fn step_width(&self) -> f32 {
        self.config.step_width_factor * self.config.radius
    }

    pub fn falloff(&self) -> Falloff {
        if self.config.linear_falloff {
            Falloff::Linear
        } else {
            Falloff::Smooth
        }
    }

    pub fn toggle_invert(&mut self) {
        self.config.invert = !self.config.invert;
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = Some(direction);
    }

    pub fn use_average_direction(&mut self) {
        self.direction = None;
    }

    // ========================================================================
    // Position
    // ========================================================================

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position.map(|(_, current)| current)
    }

    pub fn last_position(&self) -> Option<Vec3> {
        self.position.map(|(last, _)| last)
    }

    /// Movement of the last accepted step
    pub fn delta(&self) -> Option<Vec3> {
        self.position.map(|(last, current)| current - last)
    }

    /// Place the brush, forgetting the previous position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = Some((position, position));
    }

    /// Move the brush by `delta` if that is more than the step width.
    ///
    /// Returns whether the brush moved. Without a position nothing moves.
    pub fn update_delta(&mut self, delta: Vec3) -> bool {
        let Some((_, current)) = self.position else {
            return false;
        };
        let step_width = self.step_width();
        if delta.length_squared() > step_width * step_width {
            self.position = Some((current, current + delta));
            true
        } else {
            false
        }
    }

    /// Move the brush to `position`, subject to the step width.
    ///
    /// The first call of a stroke always succeeds.
    pub fn update_position(&mut self, position: Vec3) -> bool {
        match self.position {
            Some((_, current)) => self.update_delta(position - current),
            None => {
                self.set_position(position);
                true
            }
        }
    }

    pub fn reset_position(&mut self) {
        self.position = None;
    }

    /// Center of the next dab
    pub fn dab_center(&self) -> Option<Vec3> {
        if self.use_last_position {
            self.last_position()
        } else {
            self.position()
        }
    }

    // ========================================================================
    // Sculpting
    // ========================================================================

    /// Collect the faces under the brush into `affected` and, in carve mode,
    /// displace their vertices.
    ///
    /// `face` is the picked face the neighborhood query grows from. Faces
    /// around moved vertices are added and everything is committed. Returns
    /// false if the brush has no position or touches nothing.
    pub fn sculpt(&self, edit: &mut MeshEdit<'_>, face: FaceId, affected: &mut AffectedFaces) -> bool {
        let Some(center) = self.dab_center() else {
            return false;
        };
        let sphere = Sphere::new(center, self.radius());
        let hit = match self.domain {
            DomainQuery::Octree => edit.mesh().intersect_sphere(&sphere, affected),
            DomainQuery::Neighborhood => extend_from_face(edit.mesh(), &sphere, face, affected),
        };
        if !hit {
            trace!("Brush at {center} touches nothing");
            return false;
        }
        if self.mode != BrushMode::Carve {
            return true;
        }

        let vertices = affected.to_vertex_set(edit.mesh());
        let direction = self.sculpt_direction(edit.mesh(), &vertices);
        let (intensity, inner_radius, radius) = (self.intensity(), self.inner_radius(), self.radius());
        let falloff = self.falloff();
        let epsilon = edit.mesh().epsilon();

        let mut moved = 0;
        for vertex in vertices {
            let old = edit.mesh().position(vertex);
            let delta = intensity * falloff.evaluate(old.distance(center), inner_radius, radius, epsilon);
            if delta == 0.0 {
                continue;
            }
            edit.set_position(vertex, old + delta * direction);
            affected.insert_all(edit.mesh().vertex_faces(vertex));
            moved += 1;
        }
        affected.commit();
        trace!("Carved {moved} vertices at {center}");
        true
    }

    /// The fixed direction, or the average stored normal of `vertices`;
    /// negated when inverted
    fn sculpt_direction(&self, mesh: &WingedMesh, vertices: &BTreeSet<VertexId>) -> Vec3 {
        let direction = self.direction.unwrap_or_else(|| {
            if vertices.is_empty() {
                return Vec3::ZERO;
            }
            vertices.iter().map(|&v| mesh.normal(v)).sum::<Vec3>() / vertices.len() as f32
        });
        if self.config.invert {
            -direction
        } else {
            direction
        }
    }
}

/// Grow a domain from `face` across neighbours touching `sphere`.
///
/// Faces are inserted into `affected` and committed. Returns false if
/// `face` itself does not touch the sphere.
pub fn extend_from_face(mesh: &WingedMesh, sphere: &Sphere, face: FaceId, affected: &mut AffectedFaces) -> bool {
    let touches = |face: FaceId| sphere_triangle(sphere, &mesh.face_triangle(face));
    if mesh.get_face(face).is_none() || !touches(face) {
        return false;
    }

    let mut visited = BTreeSet::from([face]);
    let mut queue = VecDeque::from([face]);
    while let Some(current) = queue.pop_front() {
        affected.insert(current);
        for neighbor in mesh.face_neighbors(current) {
            if visited.insert(neighbor) && touches(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }
    affected.commit();
    true
}
