//! Mesh Invariant Tests - Manifold, Undo, Octree and Edge Cases
//!
//! Properties that must hold across operators, actions and the stroke
//! pipeline, checked on the closed primitive shapes.

use std::collections::BTreeSet;

use glam::Vec3;
use sculpt_config::{CarveConfig, KernelConfig};
use sculpting::partial::{
    collapse_edge, delete_vertex, insert_edge_vertex, split_and_triangulate_edge, triangulate_quad,
};
use sculpting::{
    BrushMode, History, MeshEdit, MeshRegistry, SculptingPipeline, Transaction, action, finalize,
};
use winged::{
    AffectedFaces, EdgeId, FaceId, Identifier, MeshDefinition, Plane, Ray, VertexId, WingedMesh,
};

// ============================================================================
// Helpers
// ============================================================================

fn mesh(definition: MeshDefinition) -> WingedMesh {
    WingedMesh::from_definition(&definition, KernelConfig::default()).unwrap()
}

fn assert_clean(mesh: &WingedMesh) {
    assert_eq!(mesh.validate(), Ok(()));
    assert_eq!(mesh.validate_buffers(), Ok(()));
    assert_eq!(mesh.octree().num_degenerated_faces(), 0);
}

/// Live positions, live render indices and element counts
#[derive(Debug, PartialEq)]
struct Snapshot {
    positions: Vec<(VertexId, Vec3)>,
    indices: Vec<(FaceId, [u32; 3])>,
    counts: (usize, usize, usize),
}

fn snapshot(mesh: &WingedMesh) -> Snapshot {
    Snapshot {
        positions: mesh.vertex_ids().map(|v| (v, mesh.position(v))).collect(),
        indices: mesh.face_ids().map(|f| (f, mesh.face_indices(f))).collect(),
        counts: (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces()),
    }
}

fn stroke(
    registry: &mut MeshRegistry,
    history: &mut History,
    mesh: Identifier,
    directions: &[Vec3],
) {
    let mut pipeline = SculptingPipeline::new(*registry.config());
    stroke_with(&mut pipeline, registry, history, mesh, directions);
}

fn stroke_with(
    pipeline: &mut SculptingPipeline,
    registry: &mut MeshRegistry,
    history: &mut History,
    mesh: Identifier,
    directions: &[Vec3],
) {
    for (i, &direction) in directions.iter().enumerate() {
        let ray = Ray::new(3.0 * direction, -direction);
        let Some(hit) = registry.get(mesh).unwrap().intersect_ray(&ray) else {
            continue;
        };
        if i == 0 {
            pipeline.begin_stroke(registry, history, mesh, hit.face, hit.point).unwrap();
        } else {
            pipeline.update_stroke(registry, hit.face, hit.point).unwrap();
        }
    }
    pipeline.end_stroke(history);
}

// ============================================================================
// Manifold Invariant
// ============================================================================

#[test]
fn test_actions_keep_the_mesh_manifold() {
    let mut registry = MeshRegistry::default();
    let mut history = History::new();
    let id = history.create_mesh(&mut registry, &MeshDefinition::icosphere(2)).unwrap();

    history
        .record(&mut registry, id, |edit| {
            let plane = Plane::new(Vec3::new(0.0, 0.2, 0.0), Vec3::new(0.3, 1.0, 0.1));
            action::split_mesh(edit, &plane)
        })
        .unwrap();
    assert_clean(registry.get(id).unwrap());

    let directions = [
        Vec3::Y,
        Vec3::new(0.1, 1.0, 0.0).normalize(),
        Vec3::new(0.2, 1.0, 0.1).normalize(),
        Vec3::new(0.3, 1.0, 0.2).normalize(),
    ];
    stroke(&mut registry, &mut history, id, &directions);
    assert_clean(registry.get(id).unwrap());

    let face = registry.get(id).unwrap().some_face().unwrap();
    history
        .record(&mut registry, id, |edit| action::collapse_face(edit, face))
        .unwrap();
    assert_clean(registry.get(id).unwrap());

    history.record(&mut registry, id, action::subdivide_mesh).unwrap();
    assert_clean(registry.get(id).unwrap());
}

#[test]
fn test_reduce_stroke_keeps_the_mesh_manifold() {
    let mut registry = MeshRegistry::default();
    let mut history = History::new();
    let id = registry.create_mesh(&MeshDefinition::icosphere(3)).unwrap();
    let mut pipeline = SculptingPipeline::default();
    pipeline.brush.mode = BrushMode::Reduce;

    let hit = registry.get(id).unwrap().intersect_ray(&Ray::new(3.0 * Vec3::X, -Vec3::X)).unwrap();
    pipeline.begin_stroke(&mut registry, &mut history, id, hit.face, hit.point).unwrap();
    pipeline.end_stroke(&mut history);

    assert_clean(registry.get(id).unwrap());
}

// ============================================================================
// Undo Round-Trip
// ============================================================================

fn subdivide(edit: &mut MeshEdit<'_>) {
    action::subdivide_mesh(edit);
}

fn split(edit: &mut MeshEdit<'_>) {
    action::split_mesh(edit, &Plane::new(Vec3::new(0.0, -0.1, 0.0), Vec3::new(0.2, 1.0, 0.0)));
}

fn collapse(edit: &mut MeshEdit<'_>) {
    action::collapse_face(edit, FaceId(3));
}

fn smooth(edit: &mut MeshEdit<'_>) {
    let vertices: BTreeSet<VertexId> = (12..30).map(VertexId).collect();
    action::smooth(edit, &vertices, 3);
}

fn nudge(edit: &mut MeshEdit<'_>) {
    action::move_vertices(edit, &BTreeSet::from([VertexId(7)]), Vec3::new(0.05, 0.1, 0.0));
}

#[test]
fn test_undo_redo_round_trip() {
    let actions: [(&str, fn(&mut MeshEdit<'_>)); 5] = [
        ("subdivide", subdivide),
        ("split", split),
        ("collapse", collapse),
        ("smooth", smooth),
        ("nudge", nudge),
    ];

    for (name, run) in actions {
        let mut registry = MeshRegistry::default();
        let mut history = History::new();
        let id = registry.create_mesh(&MeshDefinition::icosphere(1)).unwrap();
        let before = snapshot(registry.get(id).unwrap());

        history.record(&mut registry, id, run).unwrap();
        let after = snapshot(registry.get(id).unwrap());
        assert_ne!(before, after, "{name} changed nothing");

        assert!(history.undo(&mut registry).unwrap());
        assert_eq!(snapshot(registry.get(id).unwrap()), before, "undo of {name}");
        assert!(history.redo(&mut registry).unwrap());
        assert_eq!(snapshot(registry.get(id).unwrap()), after, "redo of {name}");
        assert_clean(registry.get(id).unwrap());
    }
}

#[test]
fn test_stroke_undo_redo_round_trip() {
    let directions = [
        Vec3::X,
        Vec3::new(1.0, 0.1, 0.0).normalize(),
        Vec3::new(1.0, 0.2, 0.1).normalize(),
    ];

    for mode in [BrushMode::Carve, BrushMode::Smooth, BrushMode::Reduce] {
        let mut registry = MeshRegistry::default();
        let mut history = History::new();
        let id = registry.create_mesh(&MeshDefinition::icosphere(3)).unwrap();
        let before = snapshot(registry.get(id).unwrap());
        let normals = registry.get(id).unwrap().normals().to_vec();

        let mut pipeline = SculptingPipeline::default();
        pipeline.brush.mode = mode;
        stroke_with(&mut pipeline, &mut registry, &mut history, id, &directions);
        let after = snapshot(registry.get(id).unwrap());
        let stroked_normals = registry.get(id).unwrap().normals().to_vec();
        if mode == BrushMode::Carve {
            assert_ne!(before, after, "carve stroke changed nothing");
        }
        if !history.can_undo() {
            assert_eq!(before, after, "{mode:?} stroke changed the mesh without recording it");
            continue;
        }

        assert!(history.undo(&mut registry).unwrap());
        assert_eq!(snapshot(registry.get(id).unwrap()), before, "undo of {mode:?} stroke");
        assert_eq!(registry.get(id).unwrap().normals(), &normals[..]);
        assert!(history.redo(&mut registry).unwrap());
        assert_eq!(snapshot(registry.get(id).unwrap()), after, "redo of {mode:?} stroke");
        assert_eq!(registry.get(id).unwrap().normals(), &stroked_normals[..]);
        assert_clean(registry.get(id).unwrap());
    }
}

#[test]
fn test_undo_of_no_op_is_a_no_op() {
    let mut registry = MeshRegistry::default();
    let mut history = History::new();
    let id = registry.create_mesh(&MeshDefinition::octahedron()).unwrap();

    // A plane far away from the mesh does nothing, so nothing is recorded
    history
        .record(&mut registry, id, |edit| {
            action::split_mesh(edit, &Plane::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y))
        })
        .unwrap();

    assert!(!history.can_undo());
    assert!(!history.undo(&mut registry).unwrap());
}

// ============================================================================
// Finalize
// ============================================================================

#[test]
fn test_finalize_twice_is_a_no_op() {
    let mut mesh = mesh(MeshDefinition::icosphere(1));
    let mut transaction = Transaction::new(mesh.identifier());
    action::move_vertices(
        &mut transaction.edit(&mut mesh),
        &BTreeSet::from([VertexId(0), VertexId(1)]),
        Vec3::new(0.0, 0.2, 0.0),
    );
    let operations = transaction.len();
    let buffers = snapshot(&mesh);
    let normals = mesh.normals().to_vec();

    let mut edit = transaction.edit(&mut mesh);
    finalize(&mut edit, &mut AffectedFaces::new());
    finalize(&mut edit, &mut AffectedFaces::new());

    assert_eq!(transaction.len(), operations);
    assert_eq!(snapshot(&mesh), buffers);
    assert_eq!(mesh.normals(), &normals[..]);
}

// ============================================================================
// Insert / Collapse
// ============================================================================

#[test]
fn test_split_then_collapse_restores_counts() {
    for slot in 0..10 {
        let mut mesh = mesh(MeshDefinition::icosphere(1));
        let counts = (mesh.num_vertices(), mesh.num_edges(), mesh.num_faces());
        let edge = EdgeId(slot);
        let middle = mesh.edge_middle(edge);
        let mut transaction = Transaction::new(mesh.identifier());
        let mut affected = AffectedFaces::new();
        let mut edit = transaction.edit(&mut mesh);

        let vertex = split_and_triangulate_edge(&mut edit, &mut affected, edge, middle);
        let spoke = edit.mesh().vertex(vertex).edge.unwrap();
        assert!(collapse_edge(&mut edit, &mut affected, spoke), "edge {slot}");
        finalize(&mut edit, &mut affected);

        assert_eq!((mesh.num_vertices(), mesh.num_edges(), mesh.num_faces()), counts);
        assert_clean(&mesh);
    }
}

/// Two stacked triangle antiprisms with capped ends. The middle ring
/// `0, 1, 2` is a triangle of edges that bounds no face.
fn pinched_ring() -> MeshDefinition {
    let ring = |angle: f32, z: f32| {
        let angle = angle.to_radians();
        Vec3::new(angle.cos(), angle.sin(), z)
    };
    let positions = vec![
        ring(0.0, 0.0),
        ring(120.0, 0.0),
        ring(240.0, 0.0),
        ring(60.0, 1.0),
        ring(180.0, 1.0),
        ring(300.0, 1.0),
        ring(60.0, -1.0),
        ring(180.0, -1.0),
        ring(300.0, -1.0),
    ];
    let (a, b, c, p, q, r, s, t, u) = (0, 1, 2, 3, 4, 5, 6, 7, 8);
    #[rustfmt::skip]
    let indices = vec![
        p, q, r,
        a, b, p,  b, c, q,  c, a, r,
        p, b, q,  q, c, r,  r, a, p,
        b, a, s,  c, b, t,  a, c, u,
        t, b, s,  u, c, t,  s, a, u,
        s, u, t,
    ];
    MeshDefinition::new(positions, indices)
}

#[test]
fn test_collapse_guard_refuses_pinch() {
    let mut mesh = mesh(pinched_ring());
    assert_eq!(mesh.validate(), Ok(()));
    let edge = mesh.find_edge(VertexId(0), VertexId(1)).unwrap();
    let before = snapshot(&mesh);
    let mut transaction = Transaction::new(mesh.identifier());
    let mut affected = AffectedFaces::new();

    assert!(!collapse_edge(&mut transaction.edit(&mut mesh), &mut affected, edge));

    assert!(transaction.is_empty());
    assert!(affected.is_empty());
    assert_eq!(snapshot(&mesh), before);
}

// ============================================================================
// Octree Containment
// ============================================================================

#[test]
fn test_octree_holds_every_live_face_once() {
    let mut registry = MeshRegistry::default();
    let mut history = History::new();
    let id = registry.create_mesh(&MeshDefinition::icosphere(2)).unwrap();
    stroke(&mut registry, &mut history, id, &[Vec3::Z, Vec3::new(0.0, 0.2, 1.0).normalize()]);

    let mesh = registry.get(id).unwrap();
    for face in mesh.face_ids() {
        let mut affected = AffectedFaces::new();
        let sphere = mesh.face_triangle(face).bounding_sphere();
        assert!(mesh.intersect_sphere(&sphere, &mut affected));
        assert!(affected.contains(face), "{face} not found by its bounding sphere");
        assert_eq!(mesh.octree().scan_face(face).len(), 1);
    }
    assert_eq!(mesh.octree().num_faces(), mesh.num_faces());
}

#[test]
fn test_deleted_faces_leave_the_octree() {
    let mut mesh = mesh(MeshDefinition::icosphere(1));
    let edge = EdgeId(0);
    let (left, right) = (mesh.edge(edge).left_face, mesh.edge(edge).right_face);
    let mut transaction = Transaction::new(mesh.identifier());
    let mut affected = AffectedFaces::new();

    let mut edit = transaction.edit(&mut mesh);
    assert!(collapse_edge(&mut edit, &mut affected, edge));
    finalize(&mut edit, &mut affected);

    for face in [left, right] {
        if mesh.get_face(face).is_none() {
            assert!(mesh.octree().scan_face(face).is_empty());
        }
    }
    assert_eq!(mesh.octree().num_faces(), 78);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_triangulating_a_merged_quad_adds_one_face() {
    let mut mesh = mesh(MeshDefinition::icosphere(1));
    assert_eq!((mesh.num_vertices(), mesh.num_faces()), (42, 80));
    let edge = EdgeId(0);
    let (left, right) = (mesh.edge(edge).left_face, mesh.edge(edge).right_face);

    let unrelated = |mesh: &WingedMesh| -> Vec<(Identifier, Vec<Identifier>)> {
        mesh.face_ids()
            .filter(|&f| f != left && f != right)
            .map(|f| {
                let edges = mesh
                    .face_edges(f)
                    .into_iter()
                    .map(|e| mesh.edge(e).identifier)
                    .collect();
                (mesh.face(f).identifier, edges)
            })
            .collect()
    };
    let before = unrelated(&mesh);

    let mut transaction = Transaction::new(mesh.identifier());
    let mut affected = AffectedFaces::new();
    let mut edit = transaction.edit(&mut mesh);
    let middle = edit.mesh().edge_middle(edge);
    let new_edge = insert_edge_vertex(&mut edit, &mut affected, edge, middle);
    let vertex = edit.mesh().edge(new_edge).vertex2;
    assert_eq!(edit.mesh().face_num_edges(left), 4);

    triangulate_quad(&mut edit, &mut affected, left, &BTreeSet::from([vertex]));

    assert_eq!(mesh.num_faces(), 81);
    assert!(mesh.is_triangle(left));
    let after: Vec<_> = unrelated(&mesh)
        .into_iter()
        .filter(|(identifier, _)| before.iter().any(|(old, _)| old == identifier))
        .collect();
    assert_eq!(after, before);
}

#[test]
fn test_zero_intensity_carve_moves_nothing() {
    let config = KernelConfig {
        carve: CarveConfig {
            intensity_factor: 0.0,
            subdivide: false,
            relax: false,
            smooth: false,
            ..CarveConfig::default()
        },
        ..KernelConfig::default()
    };
    let mut registry = MeshRegistry::new(config);
    let mut history = History::new();
    let id = registry.create_mesh(&MeshDefinition::icosphere(2)).unwrap();
    let mesh = registry.get(id).unwrap();
    let vertex = VertexId(0);
    let (face, center) = (mesh.vertex_faces(vertex)[0], mesh.position(vertex));
    let positions = mesh.positions().to_vec();

    let mut pipeline = SculptingPipeline::new(config);
    let result = pipeline.begin_stroke(&mut registry, &mut history, id, face, center).unwrap();
    pipeline.end_stroke(&mut history);

    assert!(result.is_some());
    assert_eq!(registry.get(id).unwrap().positions(), &positions[..]);
}

#[test]
fn test_delete_vertex_of_tetrahedron() {
    let mut mesh = mesh(MeshDefinition::tetrahedron());
    let mut transaction = Transaction::new(mesh.identifier());
    let mut affected = AffectedFaces::new();

    let remaining = delete_vertex(&mut transaction.edit(&mut mesh), &mut affected, VertexId(0));

    assert_eq!(mesh.num_faces(), 2);
    assert_eq!(mesh.num_edges(), 3);
    assert_eq!(mesh.num_vertices(), 3);
    assert!(mesh.face_ids().all(|f| mesh.is_triangle(f)));
    assert!(mesh.get_face(remaining).is_some());
}
