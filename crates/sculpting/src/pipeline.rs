//! Sculpting pipeline orchestration.
//!
//! Every dab of a stroke runs the same steps on the stroke's transaction:
//! 1. Brush → domain of faces (and carved vertices)
//! 2. Post-processing, one of
//!    - reduce: collapse short edges of the domain
//!    - extend the domain, then subdivide long edges
//! 3. Relax edges, then smooth the domain (always for a smooth brush)
//! 4. Finalize
//!
//! A whole stroke is recorded as one [`Gesture`], so a single undo reverts it.

use glam::Vec3;
use sculpt_config::KernelConfig;
use tracing::{debug, trace};
use winged::{AffectedFaces, FaceId, Identifier};

use crate::action;
use crate::brush::{BrushMode, SculptBrush};
use crate::history::{Gesture, History};
use crate::partial;
use crate::registry::MeshRegistry;
use crate::transaction::{MeshEdit, Transaction, TransactionError};

/// Result of processing a single dab through the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DabResult {
    /// Faces in the domain after post-processing
    pub faces: usize,
    pub edges_subdivided: usize,
    pub edges_collapsed: usize,
    pub edges_flipped: usize,
}

/// Result of ending a stroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrokeEndResult {
    /// Dabs applied during the stroke
    pub dabs: usize,
    /// Low-level operations recorded for undo
    pub operations: usize,
}

/// Apply one dab of `brush` to the mesh behind `edit`.
///
/// Returns `None` if the brush touched nothing; the mesh is unchanged then.
pub fn sculpt(
    edit: &mut MeshEdit<'_>,
    brush: &SculptBrush,
    face: FaceId,
    config: &KernelConfig,
) -> Option<DabResult> {
    let mut domain = AffectedFaces::new();
    if !brush.sculpt(edit, face, &mut domain) {
        return None;
    }
    let mut result = postprocess(edit, brush, &mut domain, config);
    result.faces = domain.faces().len();
    action::finalize(edit, &mut domain);
    trace!(?result, "dab");
    Some(result)
}

fn postprocess(
    edit: &mut MeshEdit<'_>,
    brush: &SculptBrush,
    domain: &mut AffectedFaces,
    config: &KernelConfig,
) -> DabResult {
    let mut result = DabResult::default();

    if brush.mode == BrushMode::Reduce {
        result.edges_collapsed = action::reduce_edges(edit, domain, &config.reduce);
    } else {
        partial::extend_domain(edit.mesh(), domain, &config.subdivision);
        if brush.config.subdivide {
            result.edges_subdivided = subdivide_edges(edit, domain, brush.subdivision_threshold());
        }
    }

    // A smooth brush always smooths; its relax pass has its own switch
    let (relax, smooth) = match brush.mode {
        BrushMode::Smooth => (config.smooth.relax_edges, true),
        _ => (brush.config.relax, brush.config.smooth),
    };
    if relax {
        let edges = domain.to_edge_vec(edit.mesh());
        result.edges_flipped = action::relax_edges(edit, domain, &edges);
        domain.commit();
    }
    if smooth {
        let vertices = domain.to_vertex_set(edit.mesh());
        partial::smooth(edit, domain, &vertices, config.smooth.iterations);
        domain.commit();
    }
    result
}

/// Subdivide every domain edge longer than `4/3 * threshold`
fn subdivide_edges(edit: &mut MeshEdit<'_>, domain: &mut AffectedFaces, threshold: f32) -> usize {
    let max_length = (4.0 / 3.0) * threshold;
    let max_length_squared = max_length * max_length;

    let mut subdivided = 0;
    for edge in domain.to_edge_vec(edit.mesh()) {
        if edit.mesh().edge_length_squared(edge) > max_length_squared {
            partial::subdivide_edge(edit, domain, edge);
            subdivided += 1;
        }
    }
    domain.commit();
    subdivided
}

/// State tracked during an active stroke.
#[derive(Debug)]
struct ActiveStroke {
    transaction: Transaction,
    dabs: usize,
}

/// The sculpting pipeline drives strokes of one brush over meshes in a
/// registry and records each stroke in a [`History`].
#[derive(Debug, Default)]
pub struct SculptingPipeline {
    pub brush: SculptBrush,
    config: KernelConfig,
    active_stroke: Option<ActiveStroke>,
}

impl SculptingPipeline {
    /// Create a pipeline whose brush starts from `config.carve`
    pub fn new(config: KernelConfig) -> Self {
        Self {
            brush: SculptBrush::new(config.carve),
            config,
            active_stroke: None,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn is_stroking(&self) -> bool {
        self.active_stroke.is_some()
    }

    /// Mesh of the active stroke
    pub fn stroke_mesh(&self) -> Option<Identifier> {
        self.active_stroke.as_ref().map(|stroke| stroke.transaction.mesh())
    }

    /// Begin a stroke on `mesh` and apply the first dab at `position`.
    ///
    /// An unfinished stroke is ended first.
    pub fn begin_stroke(
        &mut self,
        registry: &mut MeshRegistry,
        history: &mut History,
        mesh: Identifier,
        face: FaceId,
        position: Vec3,
    ) -> Result<Option<DabResult>, TransactionError> {
        if self.is_stroking() {
            self.end_stroke(history);
        }
        registry.get(mesh)?;
        self.brush.set_position(position);
        self.active_stroke = Some(ActiveStroke {
            transaction: Transaction::new(mesh),
            dabs: 0,
        });
        debug!("Begin stroke on mesh {mesh}");
        self.apply_dab(registry, face)
    }

    /// Move the brush to `position` and apply a dab there.
    ///
    /// Returns `Ok(None)` without a dab if the brush moved less than its
    /// step width, touched nothing, or no stroke is active.
    pub fn update_stroke(
        &mut self,
        registry: &mut MeshRegistry,
        face: FaceId,
        position: Vec3,
    ) -> Result<Option<DabResult>, TransactionError> {
        if !self.is_stroking() || !self.brush.update_position(position) {
            return Ok(None);
        }
        self.apply_dab(registry, face)
    }

    fn apply_dab(&mut self, registry: &mut MeshRegistry, face: FaceId) -> Result<Option<DabResult>, TransactionError> {
        let Some(stroke) = self.active_stroke.as_mut() else {
            return Ok(None);
        };
        let mesh = registry.get_mut(stroke.transaction.mesh())?;
        if mesh.get_face(face).is_none() {
            return Ok(None);
        }
        let result = sculpt(&mut stroke.transaction.edit(mesh), &self.brush, face, &self.config);
        if result.is_some() {
            stroke.dabs += 1;
        }
        Ok(result)
    }

    /// End the stroke and record it in `history`.
    ///
    /// Returns `None` if no stroke was active.
    pub fn end_stroke(&mut self, history: &mut History) -> Option<StrokeEndResult> {
        let ActiveStroke { mut transaction, dabs } = self.active_stroke.take()?;
        self.brush.reset_position();
        transaction.mark_applied();

        let result = StrokeEndResult {
            dabs,
            operations: transaction.len(),
        };
        debug!(dabs, operations = result.operations, "End stroke on mesh {}", transaction.mesh());
        history.push(Gesture::Edit(transaction));
        Some(result)
    }

    /// Abort the stroke and revert everything it did
    pub fn cancel_stroke(&mut self, registry: &mut MeshRegistry) -> Result<(), TransactionError> {
        let Some(ActiveStroke { mut transaction, .. }) = self.active_stroke.take() else {
            return Ok(());
        };
        self.brush.reset_position();
        transaction.mark_applied();
        let mesh = registry.get_mut(transaction.mesh())?;
        transaction.undo(mesh)
    }
}
