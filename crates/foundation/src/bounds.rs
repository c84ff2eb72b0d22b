use crate::math::Vec3;

/// World-space ray. `dir` does not need to be normalized by callers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

/// Axis-aligned bounding box in the local frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb3 { min, max }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Aabb3 {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Slab test. Returns the entry distance along the normalized ray, or
    /// `None` when the ray misses or the box lies behind the origin.
    pub fn ray_hit_t(&self, ray: &Ray) -> Option<f64> {
        let dir = ray.dir.normalize()?.as_array();
        let origin = ray.origin.as_array();
        let min = self.min.as_array();
        let max = self.max.as_array();

        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];

            if d.abs() < 1e-12 {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (min[axis] - o) * inv;
            let mut t2 = (max[axis] - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_max < t_min {
                return None;
            }
        }

        Some(t_min)
    }
}

/// Ray/sphere test. Returns the entry distance (0 when the origin is inside).
pub fn ray_sphere_hit_t(ray: &Ray, center: Vec3, radius: f64) -> Option<f64> {
    let dir = ray.dir.normalize()?;
    let oc = ray.origin - center;
    let b = oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let far = -b + sqrt_disc;
    if far < 0.0 {
        return None;
    }
    Some((-b - sqrt_disc).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::{Aabb3, Ray, ray_sphere_hit_t};
    use crate::math::Vec3;

    #[test]
    fn ray_hits_box_in_front() {
        let b = Aabb3::from_center(Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(b.ray_hit_t(&ray), Some(4.0));
    }

    #[test]
    fn ray_misses_box_behind_or_beside() {
        let b = Aabb3::from_center(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(b.ray_hit_t(&ray), None);

        let side = Aabb3::from_center(Vec3::new(5.0, 3.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(side.ray_hit_t(&ray), None);
    }

    #[test]
    fn ray_sphere_entry_distance() {
        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let t = ray_sphere_hit_t(&ray, Vec3::ZERO, 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-12);
        assert_eq!(ray_sphere_hit_t(&ray, Vec3::new(5.0, 0.0, 0.0), 2.0), None);
    }

    #[test]
    fn zero_direction_never_hits() {
        let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(ray_sphere_hit_t(&ray, Vec3::ZERO, 1.0), None);
        let b = Aabb3::from_center(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(b.ray_hit_t(&ray), None);
    }
}
