use crate::core;
use crate::geom::geom;

use std::f32;
use std::sync::Arc;

/// A k-d tree used to accelerate ray-object intersections. The construction
/// and traversal mostly follow Pharr & Humphreys' Physically Based
/// Rendering, chapter 4.

/// The number of objects at which a subtree is no longer refined. (Larger
/// leaves still occur when refinement is aborted.)
const MAX_LEAF_OBJS: usize = 1;
/// The estimated cost of one object intersection.
const ISECT_COST: f32 = 80.0;
/// The estimated cost of traversing one level of the k-d tree.
const TRAVERSAL_COST: f32 = 1.0;
/// The estimated gain for producing an empty leaf.
const EMPTY_BONUS: f32 = 0.2;
/// The maximum number of nodes queued during traversal. Pharr & Humphreys
/// report that 64 is enough in practice.
const MAX_TODO: usize = 64;

/// A node in the pool. Children are referenced by pool index rather than by
/// pointer; the node "above" the split always directly follows the node
/// "below" it.
enum KdNode {
    Leaf {objs: Vec<usize>},
    Interior {axis: usize, split: f32, below: usize},
}

/// A bbox projected onto a single axis.
#[derive(Clone, Copy)]
struct BBoxEdge {
    obj: usize,
    pos: f32,
    starting: bool,
}

/// An entry in the traversal todo stack.
#[derive(Clone, Copy)]
struct KdTodo {
    node: usize,
    t_min: f32,
    t_max: f32,
}

pub struct KdTree {
    nodes: Vec<KdNode>,
    bounds: core::BBox,
    objs: Vec<Arc<dyn geom::Geom>>,
    lights: Vec<usize>,
}

struct Builder {
    nodes: Vec<KdNode>,
    obj_bounds: Vec<core::BBox>,
    edges: Vec<BBoxEdge>,
}

impl KdTree {
    /// Builds a k-d tree over the given geometry. Composite geometry is
    /// refined first, so the tree's object list may be longer than the
    /// input list.
    pub fn build(geoms: Vec<Arc<dyn geom::Geom>>) -> KdTree {
        let mut objs: Vec<Arc<dyn geom::Geom>> = Vec::new();
        for g in geoms {
            let refined = g.refine();
            if refined.is_empty() {
                objs.push(g);
            }
            else {
                objs.extend(refined);
            }
        }

        let lights = objs.iter()
            .enumerate()
            .filter(|&(_, obj)| obj.light().is_some())
            .map(|(i, _)| i)
            .collect();

        if objs.is_empty() {
            return KdTree {
                nodes: vec![KdNode::Leaf {objs: Vec::new()}],
                bounds: core::BBox::empty(),
                objs,
                lights,
            };
        }

        // Compute per-object bounds, slightly dilated so that flat objects
        // (discs, axis-aligned triangles) don't produce zero-thickness
        // slabs. The tree bounds are their union.
        let mut bounds = core::BBox::empty();
        let mut obj_bounds = Vec::with_capacity(objs.len());
        for obj in &objs {
            let b = obj.bounds().expand_margin(core::VERY_SMALL);
            bounds = bounds.expand_bbox(&b);
            obj_bounds.push(b);
        }

        let max_depth =
            f32::round(8.0 + 1.3 * f32::log2(objs.len() as f32)) as i32;

        let mut builder = Builder {
            nodes: vec![KdNode::Leaf {objs: Vec::new()}],
            obj_bounds,
            edges: Vec::with_capacity(2 * objs.len()),
        };
        let obj_ids = (0..objs.len()).collect();
        builder.build_node(0, bounds, obj_ids, max_depth, 0);

        KdTree {nodes: builder.nodes, bounds, objs, lights}
    }

    /// All (refined) geometry in the tree.
    pub fn objects(&self) -> &[Arc<dyn geom::Geom>] {
        &self.objs
    }

    /// Indices into KdTree::objects of the geometry carrying an area light.
    pub fn lights(&self) -> &[usize] {
        &self.lights
    }

    /// Determines the closest object (if any) that the given ray intersects,
    /// along with the intersection itself. The ray direction should be
    /// unit-length so that object distances are comparable.
    pub fn intersect(&self, ray: &core::Ray)
        -> Option<(geom::Intersection, &dyn geom::Geom)>
    {
        // Compute the initial parametric range of the ray inside the tree
        // extent; a ray that misses the root bounds misses everything.
        let (mut t_min, mut t_max) = self.bounds.intersect(ray)?;

        let inv_dir = core::Vec::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z);
        let mut todo = [KdTodo {node: 0, t_min: 0.0, t_max: 0.0}; MAX_TODO];
        let mut todo_pos = 0usize;

        let mut node_id = 0usize;
        let mut winner: Option<(geom::Intersection, &dyn geom::Geom)> = None;
        let mut winner_dist = f32::MAX;

        loop {
            // Bail out if we already found a hit closer than the node.
            if winner_dist < t_min {
                break;
            }

            match &self.nodes[node_id] {
                &KdNode::Interior {axis, split, below} => {
                    // Parametric distance along the ray to the split plane.
                    let t_plane = (split - ray.origin[axis]) * inv_dir[axis];

                    // First visit the child containing the ray origin, using
                    // the direction to break the tie for origins on the
                    // plane.
                    let below_first = ray.origin[axis] < split
                        || (ray.origin[axis] == split
                            && ray.direction[axis] <= 0.0);
                    let (first, second) = if below_first {
                        (below, below + 1)
                    } else {
                        (below + 1, below)
                    };

                    if t_plane > t_max || t_plane <= 0.0 {
                        node_id = first;
                    }
                    else if t_plane < t_min {
                        node_id = second;
                    }
                    else {
                        debug_assert!(todo_pos < MAX_TODO,
                            "k-d traversal todo stack overflow");
                        todo[todo_pos] = KdTodo {
                            node: second, t_min: t_plane, t_max};
                        todo_pos += 1;

                        node_id = first;
                        t_max = t_plane;
                    }
                }
                KdNode::Leaf {objs: leaf_objs} => {
                    for &obj_id in leaf_objs {
                        let obj = &self.objs[obj_id];
                        if let Some(isect) = obj.intersect(ray) {
                            if isect.distance < winner_dist {
                                winner_dist = isect.distance;
                                winner = Some((isect, obj.as_ref()));
                            }
                        }
                    }

                    if todo_pos > 0 {
                        todo_pos -= 1;
                        node_id = todo[todo_pos].node;
                        t_min = todo[todo_pos].t_min;
                        t_max = todo[todo_pos].t_max;
                    }
                    else {
                        break;
                    }
                }
            }
        }

        winner
    }

    /// Determines whether any object in the tree blocks the given ray within
    /// the maximum distance. Stops at the first hit found rather than
    /// searching for the closest.
    pub fn intersect_shadow(&self, ray: &core::Ray, max_dist: f32) -> bool {
        let (mut t_min, mut t_max) = match self.bounds.intersect(ray) {
            Some(interval) => interval,
            None => return false,
        };

        let inv_dir = core::Vec::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z);
        let mut todo = [KdTodo {node: 0, t_min: 0.0, t_max: 0.0}; MAX_TODO];
        let mut todo_pos = 0usize;
        let mut node_id = 0usize;

        loop {
            // The rest of this subtree lies beyond the occlusion range.
            if t_min > max_dist {
                break;
            }

            match &self.nodes[node_id] {
                &KdNode::Interior {axis, split, below} => {
                    let t_plane = (split - ray.origin[axis]) * inv_dir[axis];
                    let below_first = ray.origin[axis] < split
                        || (ray.origin[axis] == split
                            && ray.direction[axis] <= 0.0);
                    let (first, second) = if below_first {
                        (below, below + 1)
                    } else {
                        (below + 1, below)
                    };

                    if t_plane > t_max || t_plane <= 0.0 {
                        node_id = first;
                    }
                    else if t_plane < t_min {
                        node_id = second;
                    }
                    else {
                        debug_assert!(todo_pos < MAX_TODO,
                            "k-d traversal todo stack overflow");
                        todo[todo_pos] = KdTodo {
                            node: second, t_min: t_plane, t_max};
                        todo_pos += 1;

                        node_id = first;
                        t_max = t_plane;
                    }
                }
                KdNode::Leaf {objs: leaf_objs} => {
                    for &obj_id in leaf_objs {
                        if self.objs[obj_id].intersect_shadow(ray, max_dist) {
                            return true;
                        }
                    }

                    if todo_pos > 0 {
                        todo_pos -= 1;
                        node_id = todo[todo_pos].node;
                        t_min = todo[todo_pos].t_min;
                        t_max = todo[todo_pos].t_max;
                    }
                    else {
                        break;
                    }
                }
            }
        }

        false
    }
}

impl Builder {
    /// Recursively builds out the subtree rooted at node_id over the objects
    /// in node_objs. The termination rules follow PBR: small or
    /// depth-exhausted nodes become leaves outright, and refinement is
    /// abandoned after repeated splits that cost more than leaving the node
    /// alone.
    fn build_node(
        &mut self,
        node_id: usize,
        node_bounds: core::BBox,
        node_objs: Vec<usize>,
        depth: i32,
        mut bad_refines: u32)
    {
        if node_objs.len() <= MAX_LEAF_OBJS || depth == 0 {
            self.nodes[node_id] = KdNode::Leaf {objs: node_objs};
            return;
        }

        let old_cost = ISECT_COST * node_objs.len() as f32;
        let inv_total_sa = 1.0 / node_bounds.surface_area();
        let d = node_bounds.diagonal();

        let mut best_offset: Option<usize> = None;
        let mut best_cost = f32::MAX;

        // Start along the node's longest axis; if no usable split shows up
        // there, retry the two other axes before giving up. Since a retry
        // only happens while nothing was found, the edge buffer always holds
        // the winning axis when the loop ends.
        let mut ax = node_bounds.maximum_extent();
        let mut retries = 0;
        loop {
            // Project every object's bounds onto the axis, one start and one
            // end edge per object, ordered so that a start precedes an end
            // at equal positions.
            self.edges.clear();
            for &obj in &node_objs {
                let b = &self.obj_bounds[obj];
                self.edges.push(BBoxEdge {obj, pos: b.lower[ax], starting: true});
                self.edges.push(BBoxEdge {obj, pos: b.upper[ax], starting: false});
            }
            self.edges.sort_by(|a, b| {
                a.pos.partial_cmp(&b.pos)
                    .expect("geometry bounds must not be NaN")
                    .then(b.starting.cmp(&a.starting))
            });

            // Sweep the edges, keeping count of the objects on each side,
            // and record the cheapest split strictly inside the node.
            let mut n_below = 0usize;
            let mut n_above = node_objs.len();
            for i in 0..self.edges.len() {
                let edge = self.edges[i];
                if !edge.starting {
                    n_above -= 1;
                }

                if edge.pos > node_bounds.lower[ax]
                    && edge.pos < node_bounds.upper[ax]
                {
                    let other0 = (ax + 1) % 3;
                    let other1 = (ax + 2) % 3;
                    let below_sa = 2.0 * (d[other0] * d[other1]
                        + (edge.pos - node_bounds.lower[ax])
                            * (d[other0] + d[other1]));
                    let above_sa = 2.0 * (d[other0] * d[other1]
                        + (node_bounds.upper[ax] - edge.pos)
                            * (d[other0] + d[other1]));
                    let prob_below = below_sa * inv_total_sa;
                    let prob_above = above_sa * inv_total_sa;
                    let eb = if n_above == 0 || n_below == 0 {
                        EMPTY_BONUS
                    } else {
                        0.0
                    };
                    let cost = TRAVERSAL_COST + ISECT_COST * (1.0 - eb)
                        * (prob_below * n_below as f32
                            + prob_above * n_above as f32);

                    if cost < best_cost {
                        best_cost = cost;
                        best_offset = Some(i);
                    }
                }

                if edge.starting {
                    n_below += 1;
                }
            }

            if best_offset.is_none() && retries < 2 {
                retries += 1;
                ax = (ax + 1) % 3;
                continue;
            }
            break;
        }

        if best_cost > old_cost {
            bad_refines += 1;
        }

        // Give up and emit a leaf when no valid split exists, when this
        // branch has refined badly three times, or when the best split is
        // far worse than the leaf for a smallish node.
        let give_up = (best_cost > 4.0 * old_cost && node_objs.len() < 16)
            || bad_refines == 3;
        let best_offset = match best_offset {
            Some(offset) if !give_up => offset,
            _ => {
                self.nodes[node_id] = KdNode::Leaf {objs: node_objs};
                return;
            }
        };

        // Classify objects with respect to the split. An object whose
        // bounds straddle the plane lands in both children.
        let mut below_objs = Vec::new();
        let mut above_objs = Vec::new();
        for edge in &self.edges[..best_offset] {
            if edge.starting {
                below_objs.push(edge.obj);
            }
        }
        for edge in &self.edges[(best_offset + 1)..] {
            if !edge.starting {
                above_objs.push(edge.obj);
            }
        }

        let split = self.edges[best_offset].pos;
        let mut below_bounds = node_bounds;
        let mut above_bounds = node_bounds;
        below_bounds.upper[ax] = split;
        above_bounds.lower[ax] = split;

        let below_id = self.nodes.len();
        self.nodes[node_id] = KdNode::Interior {axis: ax, split, below: below_id};
        self.nodes.push(KdNode::Leaf {objs: Vec::new()});
        self.nodes.push(KdNode::Leaf {objs: Vec::new()});

        self.build_node(below_id, below_bounds, below_objs, depth - 1, bad_refines);
        self.build_node(
            below_id + 1, above_bounds, above_objs, depth - 1, bad_refines);
    }
}
