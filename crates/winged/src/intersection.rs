//! Intersection tests between primitives.

use glam::Vec3;

use crate::primitive::{Aabb, Plane, Ray, Sphere, Triangle};

/// Ray hit on a triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit; negative only for lines
    pub t: f32,
    pub point: Vec3,
}

/// Möller–Trumbore ray/triangle test (two-sided)
pub fn ray_triangle(ray: &Ray, tri: &Triangle, epsilon: f32) -> Option<RayHit> {
    let e1 = tri.vertex2 - tri.vertex1;
    let e2 = tri.vertex3 - tri.vertex1;
    let s1 = ray.direction.cross(e2);
    let det = s1.dot(e1);

    if det.abs() < epsilon * epsilon {
        return None;
    }
    let inv_det = 1.0 / det;
    let d = ray.origin - tri.vertex1;
    let s2 = d.cross(e1);
    let b1 = d.dot(s1) * inv_det;
    let b2 = ray.direction.dot(s2) * inv_det;
    let t = e2.dot(s2) * inv_det;

    if b1 < 0.0 || b2 < 0.0 || b1 + b2 > 1.0 || (t < 0.0 && !ray.is_line) {
        None
    } else {
        Some(RayHit {
            t,
            point: ray.point_at(t),
        })
    }
}

/// Slab test
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> bool {
    let inv_dir = Vec3::ONE / ray.direction;
    let lower = (aabb.min - ray.origin) * inv_dir;
    let upper = (aabb.max - ray.origin) * inv_dir;
    let t_min = lower.min(upper).max_element();
    let t_max = lower.max(upper).min_element();

    (t_max >= 0.0 || ray.is_line) && t_min <= t_max
}

pub fn ray_plane(ray: &Ray, plane: &Plane, epsilon: f32) -> Option<f32> {
    let denom = ray.direction.dot(plane.normal);
    if denom.abs() < epsilon {
        return None;
    }
    let t = (plane.point - ray.origin).dot(plane.normal) / denom;
    if t < 0.0 && !ray.is_line {
        None
    } else {
        Some(t)
    }
}

pub fn sphere_aabb(sphere: &Sphere, aabb: &Aabb) -> bool {
    let closest = sphere.center.clamp(aabb.min, aabb.max);
    closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
}

/// Separating-axis sphere/triangle test after Christer Ericson
pub fn sphere_triangle(sphere: &Sphere, tri: &Triangle) -> bool {
    let a = tri.vertex1 - sphere.center;
    let b = tri.vertex2 - sphere.center;
    let c = tri.vertex3 - sphere.center;

    let rr = sphere.radius * sphere.radius;
    let v = (b - a).cross(c - a);
    let d = a.dot(v);
    let e = v.dot(v);
    let sep1 = d * d > rr * e;

    let aa = a.dot(a);
    let ab = a.dot(b);
    let ac = a.dot(c);
    let bb = b.dot(b);
    let bc = b.dot(c);
    let cc = c.dot(c);
    let sep2 = aa > rr && ab > aa && ac > aa;
    let sep3 = bb > rr && ab > bb && bc > bb;
    let sep4 = cc > rr && ac > cc && bc > cc;

    let ab_edge = b - a;
    let bc_edge = c - b;
    let ca_edge = a - c;

    let d1 = ab - aa;
    let d2 = bc - bb;
    let d3 = ac - cc;
    let e1 = ab_edge.dot(ab_edge);
    let e2 = bc_edge.dot(bc_edge);
    let e3 = ca_edge.dot(ca_edge);

    let q1 = a * e1 - ab_edge * d1;
    let q2 = b * e2 - bc_edge * d2;
    let q3 = c * e3 - ca_edge * d3;
    let qc = c * e1 - q1;
    let qa = a * e2 - q2;
    let qb = b * e3 - q3;

    let sep5 = q1.dot(q1) > rr * e1 * e1 && q1.dot(qc) > 0.0;
    let sep6 = q2.dot(q2) > rr * e2 * e2 && q2.dot(qa) > 0.0;
    let sep7 = q3.dot(q3) > rr * e3 * e3 && q3.dot(qb) > 0.0;

    !(sep1 || sep2 || sep3 || sep4 || sep5 || sep6 || sep7)
}

pub fn plane_aabb(plane: &Plane, aabb: &Aabb) -> bool {
    let half = aabb.size() * 0.5;
    let radius = half.dot(plane.normal.abs());
    plane.distance(aabb.center()).abs() <= radius
}

/// Whether the plane passes through the triangle (within `epsilon`)
pub fn plane_triangle(plane: &Plane, tri: &Triangle, epsilon: f32) -> bool {
    let d1 = plane.distance(tri.vertex1);
    let d2 = plane.distance(tri.vertex2);
    let d3 = plane.distance(tri.vertex3);
    let min = d1.min(d2).min(d3);
    let max = d1.max(d2).max(d3);
    min <= epsilon && max >= -epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle {
        Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)
    }

    #[test]
    fn test_ray_hits_triangle_from_both_sides() {
        let tri = unit_triangle();
        let down = Ray::new(Vec3::new(0.25, 0.25, 1.0), -Vec3::Z);
        let up = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::Z);

        let hit = ray_triangle(&down, &tri, 1e-4).unwrap();
        assert_relative_eq!(hit.t, 1.0, epsilon = 1e-6);
        assert!(ray_triangle(&up, &tri, 1e-4).is_some());
    }

    #[test]
    fn test_ray_behind_origin_only_hits_lines() {
        let tri = unit_triangle();
        let away = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(ray_triangle(&away, &tri, 1e-4).is_none());

        let line = Ray::line(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        let hit = ray_triangle(&line, &tri, 1e-4).unwrap();
        assert_relative_eq!(hit.t, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_triangle() {
        let tri = unit_triangle();
        assert!(sphere_triangle(&Sphere::new(Vec3::new(0.2, 0.2, 0.05), 0.1), &tri));
        assert!(!sphere_triangle(&Sphere::new(Vec3::new(0.2, 0.2, 0.5), 0.1), &tri));
        assert!(!sphere_triangle(&Sphere::new(Vec3::new(2.0, 2.0, 0.0), 0.5), &tri));
    }

    #[test]
    fn test_aabb_queries() {
        let aabb = Aabb::cube(Vec3::ZERO, 2.0);
        assert!(ray_aabb(&Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X), &aabb));
        assert!(!ray_aabb(&Ray::new(Vec3::new(-5.0, 3.0, 0.0), Vec3::X), &aabb));
        assert!(sphere_aabb(&Sphere::new(Vec3::new(1.5, 0.0, 0.0), 0.6), &aabb));
        assert!(plane_aabb(&Plane::new(Vec3::new(0.0, 0.9, 0.0), Vec3::Y), &aabb));
        assert!(!plane_aabb(&Plane::new(Vec3::new(0.0, 1.1, 0.0), Vec3::Y), &aabb));
    }

    #[test]
    fn test_plane_triangle() {
        let tri = unit_triangle();
        assert!(plane_triangle(&Plane::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X), &tri, 1e-4));
        assert!(!plane_triangle(&Plane::new(Vec3::new(2.0, 0.0, 0.0), Vec3::X), &tri, 1e-4));
    }

    #[test]
    fn test_ray_plane() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Y);
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);
        assert_relative_eq!(ray_plane(&ray, &plane, 1e-4).unwrap(), 2.0);
    }
}
