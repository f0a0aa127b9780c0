use super::{FloatType, Ray, WorldBox};

pub trait RayIntersectionExt {
    /// Calculate first and last ray intersection with the box
    fn intersect(&self, ray: &Ray) -> (FloatType, FloatType);

    /// True if the ray (not the whole line) touches the box.
    fn intersects_ray(&self, ray: &Ray) -> bool;
}

impl RayIntersectionExt for WorldBox {
    /// Calculates ray intersection with the box using the slab method.
    /// Returns minimum and maximum distance along the ray, ray intersects if min <= max.
    fn intersect(&self, ray: &Ray) -> (FloatType, FloatType) {
        // Componentwise distances along the ray to the box's min and max corners
        // The multiplication is NAN if the ray is starting on the slab bounding plane
        // and is parallel to it. In this case we replace it with +-infinity, so that the range
        // becomes infinite
        let to_box_min = (self.min - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { FloatType::NEG_INFINITY } else { x });
        let to_box_max = (self.max - ray.origin)
            .component_mul(&ray.inv_direction)
            .map(|x| if x.is_nan() { FloatType::INFINITY } else { x });

        // Correctly ordered (min_t <= max_t)
        let componentwise_min_t = to_box_min.zip_map(&to_box_max, FloatType::min);
        let componentwise_max_t = to_box_min.zip_map(&to_box_max, FloatType::max);

        (componentwise_min_t.max(), componentwise_max_t.min())
    }

    /// Boxes entirely behind the ray origin are rejected,
    /// rays starting inside the box always intersect.
    fn intersects_ray(&self, ray: &Ray) -> bool {
        let (min_t, max_t) = self.intersect(ray);
        min_t <= max_t && max_t >= 0.0
    }
}
