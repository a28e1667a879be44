use glam::{Mat4, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        AABB { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn is_visible(&self, frustum_planes: &[Vec4; 6]) -> bool {
        let margin = Vec3::splat(2.0);
        let expanded_min = self.min - margin;
        let expanded_max = self.max + margin;

        for plane in frustum_planes {
            let p = Vec3::new(
                if plane.x > 0.0 {
                    expanded_max.x
                } else {
                    expanded_min.x
                },
                if plane.y > 0.0 {
                    expanded_max.y
                } else {
                    expanded_min.y
                },
                if plane.z > 0.0 {
                    expanded_max.z
                } else {
                    expanded_min.z
                },
            );
            if plane.truncate().dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }

    /// Slab test. Returns the entry distance along `direction` and the axis
    /// normal of the face the ray enters through.
    pub fn ray_intersection(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d == 0.0 {
                // Parallel to this slab
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }

            let mut t1 = (self.min[axis] - o) / d;
            let mut t2 = (self.max[axis] - o) / d;
            let mut entry_sign = -1.0;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                entry_sign = 1.0;
            }

            if t1 > t_min {
                t_min = t1;
                normal = Vec3::ZERO;
                normal[axis] = entry_sign;
            }
            t_max = t_max.min(t2);

            if t_max < t_min {
                return None;
            }
        }

        // Origin inside the box: the hit is where the ray leaves it
        let t_near = if t_min >= 0.0 { t_min } else { t_max };
        (t_near >= 0.0).then_some((t_near, normal))
    }
}

pub fn extract_frustum_planes(view_proj: &Mat4) -> [Vec4; 6] {
    let r0 = view_proj.row(0);
    let r1 = view_proj.row(1);
    let r2 = view_proj.row(2);
    let r3 = view_proj.row(3);

    let mut planes = [
        // Left
        r3 + r0,
        // Right
        r3 - r0,
        // Bottom
        r3 + r1,
        // Top
        r3 - r1,
        // Near (depth is [0, 1])
        r2,
        // Far
        r3 - r2,
    ];

    // Normalize planes so that distances are in world units
    for plane in &mut planes {
        let length = plane.truncate().length();
        *plane /= length;
    }

    planes
}
