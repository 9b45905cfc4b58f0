//! Indexed triangle soups and a few closed primitive shapes.
//!
//! All shapes are wound counter-clockwise when seen from outside.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Vertex positions plus triangle index triples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDefinition {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshDefinition {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn add_vertex(&mut self, position: Vec3) -> u32 {
        self.positions.push(position);
        self.positions.len() as u32 - 1
    }

    pub fn add_face(&mut self, i1: u32, i2: u32, i3: u32) -> usize {
        self.indices.extend_from_slice(&[i1, i2, i3]);
        self.num_faces() - 1
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn num_faces(&self) -> usize {
        self.indices.len() / 3
    }

    /// Scale, then translate every position
    pub fn transformed(mut self, scale: f32, translation: Vec3) -> Self {
        for position in &mut self.positions {
            *position = *position * scale + translation;
        }
        self
    }

    /// Unit cube centered at the origin
    pub fn cube() -> Self {
        let d = 0.5;
        let mut m = Self::default();
        m.add_vertex(Vec3::new(-d, -d, -d));
        m.add_vertex(Vec3::new(-d, -d, d));
        m.add_vertex(Vec3::new(-d, d, -d));
        m.add_vertex(Vec3::new(-d, d, d));
        m.add_vertex(Vec3::new(d, -d, -d));
        m.add_vertex(Vec3::new(d, -d, d));
        m.add_vertex(Vec3::new(d, d, -d));
        m.add_vertex(Vec3::new(d, d, d));

        for [a, b, c] in [
            [0, 1, 2],
            [3, 2, 1],
            [1, 5, 3],
            [7, 3, 5],
            [5, 4, 7],
            [6, 7, 4],
            [4, 0, 6],
            [2, 6, 0],
            [3, 7, 2],
            [6, 2, 7],
            [0, 4, 1],
            [5, 1, 4],
        ] {
            m.add_face(a, b, c);
        }
        m
    }

    /// Regular tetrahedron inscribed in the unit sphere
    pub fn tetrahedron() -> Self {
        let mut m = Self::default();
        for corner in [
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ] {
            m.add_vertex(corner.normalize());
        }
        m.add_face(0, 1, 2);
        m.add_face(1, 0, 3);
        m.add_face(0, 2, 3);
        m.add_face(2, 1, 3);
        m
    }

    /// Octahedron with corners on the unit axes; vertex 0 is `+Y`, vertex 1 is `-Y`
    pub fn octahedron() -> Self {
        let mut m = Self::default();
        for corner in [Vec3::Y, -Vec3::Y, Vec3::X, -Vec3::X, Vec3::Z, -Vec3::Z] {
            m.add_vertex(corner);
        }
        for [a, b, c] in [
            [0, 4, 2],
            [0, 2, 5],
            [0, 5, 3],
            [0, 3, 4],
            [1, 2, 4],
            [1, 5, 2],
            [1, 3, 5],
            [1, 4, 3],
        ] {
            m.add_face(a, b, c);
        }
        m
    }

    /// Unit icosphere, each level splitting every triangle into four
    pub fn icosphere(levels: u32) -> Self {
        let mut m = Self::default();
        let t = (1.0 + 5.0_f32.sqrt()) * 0.5;

        for corner in [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ] {
            m.add_vertex(corner.normalize());
        }

        let mut faces: Vec<[u32; 3]> = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        for _ in 0..levels {
            let mut refined = Vec::with_capacity(faces.len() * 4);
            for [i1, i2, i3] in faces {
                let i12 = m.midpoint(&mut midpoints, i1, i2);
                let i23 = m.midpoint(&mut midpoints, i2, i3);
                let i31 = m.midpoint(&mut midpoints, i3, i1);
                refined.push([i1, i12, i31]);
                refined.push([i2, i23, i12]);
                refined.push([i3, i31, i23]);
                refined.push([i12, i23, i31]);
            }
            faces = refined;
        }

        for [a, b, c] in faces {
            m.add_face(a, b, c);
        }
        m
    }

    /// Shared, normalized midpoint of the edge `(a, b)`
    fn midpoint(&mut self, cache: &mut HashMap<(u32, u32), u32>, a: u32, b: u32) -> u32 {
        let key = (a.min(b), b.max(a));
        if let Some(&index) = cache.get(&key) {
            return index;
        }
        let position = (self.positions[key.0 as usize] + self.positions[key.1 as usize]) * 0.5;
        let index = self.add_vertex(position.normalize());
        cache.insert(key, index);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_icosphere_sizes() {
        let level0 = MeshDefinition::icosphere(0);
        assert_eq!((level0.num_vertices(), level0.num_faces()), (12, 20));
        let level1 = MeshDefinition::icosphere(1);
        assert_eq!((level1.num_vertices(), level1.num_faces()), (42, 80));
        let level2 = MeshDefinition::icosphere(2);
        assert_eq!((level2.num_vertices(), level2.num_faces()), (162, 320));
    }

    #[test]
    fn test_icosphere_is_on_unit_sphere() {
        for p in MeshDefinition::icosphere(1).positions() {
            assert_relative_eq!(p.length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_shapes_wind_outwards() {
        for m in [
            MeshDefinition::cube(),
            MeshDefinition::tetrahedron(),
            MeshDefinition::octahedron(),
            MeshDefinition::icosphere(1),
        ] {
            for tri in m.indices().chunks_exact(3) {
                let [a, b, c] = [0, 1, 2].map(|i| m.positions()[tri[i] as usize]);
                let normal = (b - a).cross(c - b);
                assert!(normal.dot(a + b + c) > 0.0);
            }
        }
    }

    #[test]
    fn test_transformed() {
        let m = MeshDefinition::cube().transformed(2.0, Vec3::X);
        assert_eq!(m.positions()[7], Vec3::new(2.0, 1.0, 1.0));
    }
}
