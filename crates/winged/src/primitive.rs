//! Geometric primitives used by the octree and the brushes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Cube of edge length `width` around `center`
    pub fn cube(center: Vec3, width: f32) -> Self {
        let half = Vec3::splat(width * 0.5);
        Self::new(center - half, center + half)
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.include_point(point);
        }
        aabb
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

/// A triangle given by its three corners, in face order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertex1: Vec3,
    pub vertex2: Vec3,
    pub vertex3: Vec3,
}

impl Triangle {
    pub fn new(vertex1: Vec3, vertex2: Vec3, vertex3: Vec3) -> Self {
        Self {
            vertex1,
            vertex2,
            vertex3,
        }
    }

    pub fn edge1(&self) -> Vec3 {
        self.vertex2 - self.vertex1
    }

    pub fn edge2(&self) -> Vec3 {
        self.vertex3 - self.vertex2
    }

    /// Unit normal; zero for a degenerated triangle
    pub fn normal(&self) -> Vec3 {
        self.edge1().cross(self.edge2()).normalize_or_zero()
    }

    pub fn center(&self) -> Vec3 {
        (self.vertex1 + self.vertex2 + self.vertex3) / 3.0
    }

    pub fn minimum(&self) -> Vec3 {
        self.vertex1.min(self.vertex2).min(self.vertex3)
    }

    pub fn maximum(&self) -> Vec3 {
        self.vertex1.max(self.vertex2).max(self.vertex3)
    }

    /// Diagonal of the bounding box
    pub fn extent(&self) -> f32 {
        (self.maximum() - self.minimum()).length()
    }

    /// Largest side of the bounding box. Decides the octree depth of a face.
    pub fn one_dim_extent(&self) -> f32 {
        (self.maximum() - self.minimum()).max_element()
    }

    pub fn area(&self) -> f32 {
        0.5 * (self.vertex2 - self.vertex1)
            .cross(self.vertex3 - self.vertex1)
            .length()
    }

    pub fn longest_edge(&self) -> f32 {
        self.vertex1
            .distance(self.vertex2)
            .max(self.vertex2.distance(self.vertex3))
            .max(self.vertex3.distance(self.vertex1))
    }

    /// Altitude over the longest edge
    pub fn min_altitude(&self) -> f32 {
        let longest = self.longest_edge();
        if longest <= 0.0 {
            0.0
        } else {
            2.0 * self.area() / longest
        }
    }

    /// Whether the triangle has effectively zero area
    pub fn is_degenerated(&self, epsilon: f32) -> bool {
        self.min_altitude() < epsilon
    }

    pub fn incircle_radius(&self) -> f32 {
        let perimeter = self.vertex1.distance(self.vertex2)
            + self.vertex2.distance(self.vertex3)
            + self.vertex3.distance(self.vertex1);
        if perimeter <= 0.0 {
            0.0
        } else {
            2.0 * self.area() / perimeter
        }
    }

    pub fn bounding_sphere(&self) -> Sphere {
        let center = self.center();
        let radius = center
            .distance(self.vertex1)
            .max(center.distance(self.vertex2))
            .max(center.distance(self.vertex3));
        Sphere::new(center, radius)
    }
}

/// A ray, or an infinite line when `is_line` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
    pub is_line: bool,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            is_line: false,
        }
    }

    /// Line through `origin`, hits behind the origin count too
    pub fn line(origin: Vec3, direction: Vec3) -> Self {
        Self {
            is_line: true,
            ..Self::new(origin, direction)
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }
}

/// Plane through `point` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Signed distance, positive on the normal's side
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point - self.point)
    }

    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.distance(point)
    }
}
