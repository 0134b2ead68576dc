//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Nodes live in a flat arena and refer to their children by index. Leaves own
//! a range of the primitive index list, so the hierarchy never holds the
//! primitives themselves and can be built over any `&[H: Hittable]`.

use std::time::Instant;

use prism_math::{Aabb, DVec3, Interval, Ray};

use crate::hittable::{HitRecord, Hittable};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 2;

/// Depth at which a node becomes a leaf regardless of size.
const MAX_DEPTH: usize = 30;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node with two children, as arena indices.
    Branch { left: usize, right: usize, bbox: Aabb },
    /// Leaf covering `indices[start..start + count]`.
    Leaf { start: usize, count: usize, bbox: Aabb },
}

impl BvhNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Shape of a built hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub primitive_count: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
}

/// Index-addressed BVH over a primitive slice.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    /// Primitive indices, permuted so every leaf covers a contiguous range
    indices: Vec<usize>,
    stats: BvhStats,
}

impl Bvh {
    /// Build a BVH over `objects`. The root is node 0.
    ///
    /// Each node splits its primitives at the median centroid along the longest
    /// axis of its bounding box.
    pub fn build<H: Hittable>(objects: &[H]) -> Self {
        let started = Instant::now();

        let mut builder = Builder {
            boxes: objects.iter().map(|o| o.bounding_box()).collect(),
            centroids: objects.iter().map(|o| o.centroid()).collect(),
            nodes: Vec::with_capacity(objects.len().saturating_mul(2)),
            stats: BvhStats {
                primitive_count: objects.len(),
                ..BvhStats::default()
            },
        };

        let mut indices: Vec<usize> = (0..objects.len()).collect();
        if !indices.is_empty() {
            builder.build_node(&mut indices, 0, 0);
        }

        let stats = builder.stats;
        log::info!(
            "BVH built over {} primitives: {} nodes, {} leaves, max depth {} ({:.2?})",
            stats.primitive_count,
            stats.node_count,
            stats.leaf_count,
            stats.max_depth,
            started.elapsed()
        );

        Self {
            nodes: builder.nodes,
            indices,
            stats,
        }
    }

    pub fn stats(&self) -> BvhStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Bounds of everything in the hierarchy.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map(|n| *n.bbox()).unwrap_or(Aabb::EMPTY)
    }

    /// Nearest hit among `objects`, which must be the slice the BVH was built from.
    ///
    /// Returns the primitive index with the record.
    pub fn closest_hit<'a, H: Hittable>(
        &self,
        objects: &'a [H],
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<(usize, HitRecord<'a>)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut closest = None;
        self.hit_node(0, objects, ray, ray_t, &mut closest);
        closest
    }

    fn hit_node<'a, H: Hittable>(
        &self,
        node: usize,
        objects: &'a [H],
        ray: &Ray,
        ray_t: Interval,
        closest: &mut Option<(usize, HitRecord<'a>)>,
    ) {
        let max = closest.as_ref().map_or(ray_t.max, |(_, rec)| rec.t);
        let node = &self.nodes[node];
        if !node.bbox().hit(ray, Interval::new(ray_t.min, max)) {
            return;
        }

        match *node {
            BvhNode::Leaf { start, count, .. } => {
                for &index in &self.indices[start..start + count] {
                    let max = closest.as_ref().map_or(ray_t.max, |(_, rec)| rec.t);
                    if let Some(rec) = objects[index].hit(ray, Interval::new(ray_t.min, max)) {
                        *closest = Some((index, rec));
                    }
                }
            }
            BvhNode::Branch { left, right, .. } => {
                self.hit_node(left, objects, ray, ray_t, closest);
                self.hit_node(right, objects, ray, ray_t, closest);
            }
        }
    }
}

struct Builder {
    boxes: Vec<Aabb>,
    centroids: Vec<DVec3>,
    nodes: Vec<BvhNode>,
    stats: BvhStats,
}

impl Builder {
    /// Build the subtree for `indices`, which starts at `offset` in the full list.
    fn build_node(&mut self, indices: &mut [usize], offset: usize, depth: usize) -> usize {
        let bbox = indices
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &self.boxes[i]));

        let slot = self.nodes.len();
        self.stats.node_count += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        if indices.len() <= LEAF_MAX_SIZE || depth >= MAX_DEPTH {
            return self.push_leaf(offset, indices.len(), bbox);
        }

        let axis = bbox.longest_axis();
        let mid = indices.len() / 2;
        let centroids = &self.centroids;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            centroids[a][axis].total_cmp(&centroids[b][axis])
        });

        let (left_indices, right_indices) = indices.split_at_mut(mid);
        if left_indices.is_empty() || right_indices.is_empty() {
            return self.push_leaf(offset, left_indices.len() + right_indices.len(), bbox);
        }

        // Reserve the slot so the parent precedes its children.
        self.nodes.push(BvhNode::Leaf {
            start: offset,
            count: 0,
            bbox,
        });
        let left = self.build_node(left_indices, offset, depth + 1);
        let right = self.build_node(right_indices, offset + mid, depth + 1);
        self.nodes[slot] = BvhNode::Branch { left, right, bbox };
        slot
    }

    fn push_leaf(&mut self, start: usize, count: usize, bbox: Aabb) -> usize {
        self.stats.leaf_count += 1;
        self.nodes.push(BvhNode::Leaf { start, count, bbox });
        self.nodes.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::closest_hit_brute_force;
    use prism_core::{Material, Shape};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn grey() -> Arc<Material> {
        Arc::new(Material::new("grey", DVec3::splat(0.5)))
    }

    fn sphere_row(count: usize) -> Vec<Shape> {
        (0..count)
            .map(|i| {
                Shape::sphere(format!("s{i}"), grey()).with_trs(
                    DVec3::new(i as f64, 0.0, -5.0),
                    DVec3::ZERO,
                    DVec3::splat(0.5),
                )
            })
            .collect()
    }

    /// Every node box covers its children, and every leaf covers its primitives.
    fn assert_contains_children(bvh: &Bvh, objects: &[Shape]) {
        for node in bvh.nodes() {
            match *node {
                BvhNode::Branch { left, right, bbox } => {
                    assert!(bbox.contains_box(bvh.nodes[left].bbox()));
                    assert!(bbox.contains_box(bvh.nodes[right].bbox()));
                }
                BvhNode::Leaf { start, count, bbox } => {
                    for &i in &bvh.indices[start..start + count] {
                        assert!(bbox.contains_box(&objects[i].bounding_box()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_bvh_empty() {
        let objects: Vec<Shape> = Vec::new();
        let bvh = Bvh::build(&objects);

        assert!(bvh.is_empty());
        assert_eq!(bvh.stats().node_count, 0);
        let ray = Ray::new(DVec3::ZERO, DVec3::NEG_Z, 0.0);
        assert!(bvh.closest_hit(&objects, &ray, Interval::new(1e-5, f64::INFINITY)).is_none());
    }

    #[test]
    fn test_bvh_single_sphere_is_leaf() {
        let objects = sphere_row(1);
        let bvh = Bvh::build(&objects);

        assert!(matches!(bvh.nodes()[0], BvhNode::Leaf { count: 1, .. }));
        let ray = Ray::new(DVec3::ZERO, DVec3::NEG_Z, 0.0);
        let (index, _) = bvh
            .closest_hit(&objects, &ray, Interval::new(1e-5, f64::INFINITY))
            .expect("hit");
        assert_eq!(index, 0);
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let objects = sphere_row(10);
        let bvh = Bvh::build(&objects);

        let ray = Ray::new(DVec3::new(5.0, 0.0, 0.0), DVec3::NEG_Z, 0.0);
        let (index, rec) = bvh
            .closest_hit(&objects, &ray, Interval::new(1e-5, f64::INFINITY))
            .expect("hit");

        assert_eq!(index, 5);
        // Sphere at z = -5 with radius 0.5.
        assert!((rec.p.z - (-4.5)).abs() < 1e-9);
    }

    #[test]
    fn test_bvh_stats() {
        let objects = sphere_row(16);
        let bvh = Bvh::build(&objects);
        let stats = bvh.stats();

        assert_eq!(stats.primitive_count, 16);
        assert_eq!(stats.node_count, bvh.nodes().len());
        // Binary tree: one fewer branch than leaves.
        assert_eq!(stats.node_count, 2 * stats.leaf_count - 1);
        assert_eq!(stats.leaf_count, 8);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn test_bvh_identical_centroids_terminate() {
        let objects: Vec<Shape> = (0..50).map(|i| Shape::sphere(format!("s{i}"), grey())).collect();
        let bvh = Bvh::build(&objects);

        assert!(bvh.stats().max_depth <= MAX_DEPTH);
        let leaves: usize = bvh
            .nodes()
            .iter()
            .map(|n| match n {
                BvhNode::Leaf { count, .. } => *count,
                BvhNode::Branch { .. } => 0,
            })
            .sum();
        assert_eq!(leaves, 50);
    }

    #[test]
    fn test_bvh_containment() {
        let objects = sphere_row(37);
        let bvh = Bvh::build(&objects);
        assert_contains_children(&bvh, &objects);
    }

    fn scattered_spheres() -> impl Strategy<Value = Vec<Shape>> {
        let center = (-10.0..10.0f64, -10.0..10.0f64, -10.0..10.0f64);
        prop::collection::vec((center, 0.1..2.0f64), 1..40).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, ((x, y, z), r))| {
                    Shape::sphere(format!("s{i}"), grey()).with_trs(
                        DVec3::new(x, y, z),
                        DVec3::ZERO,
                        DVec3::splat(r),
                    )
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_bvh_containment(objects in scattered_spheres()) {
            let bvh = Bvh::build(&objects);
            assert_contains_children(&bvh, &objects);
        }

        #[test]
        fn prop_bvh_matches_brute_force(
            objects in scattered_spheres(),
            origin in (-15.0..15.0f64, -15.0..15.0f64, -15.0..15.0f64),
            target in (-5.0..5.0f64, -5.0..5.0f64, -5.0..5.0f64),
        ) {
            let bvh = Bvh::build(&objects);
            let origin = DVec3::new(origin.0, origin.1, origin.2);
            let target = DVec3::new(target.0, target.1, target.2);
            prop_assume!((target - origin).length() > 1e-3);

            let ray = Ray::new(origin, target - origin, 0.0);
            let range = Interval::new(1e-5, f64::INFINITY);
            let fast = bvh.closest_hit(&objects, &ray, range);
            let slow = closest_hit_brute_force(&objects, &ray, range);

            match (fast, slow) {
                (None, None) => {}
                (Some((i, a)), Some((j, b))) => {
                    prop_assert!((a.t - b.t).abs() < 1e-9);
                    // Only coincident spheres may disagree on which one wins.
                    let t_of = |k: usize| objects[k].hit(&ray, range).map(|h| h.t);
                    prop_assert!(i == j || t_of(i) == t_of(j), "bvh {} vs brute force {}", i, j);
                }
                (a, b) => prop_assert!(
                    false,
                    "bvh {:?} vs brute force {:?}",
                    a.map(|h| h.0),
                    b.map(|h| h.0)
                ),
            }
        }
    }
}
