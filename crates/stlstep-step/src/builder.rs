//! Triangle soup → open-shell B-rep body.
//!
//! Each non-degenerate triangle becomes one planar `ADVANCED_FACE` bounded by
//! a three-edge loop. Points, directions, vertices and edges are shared
//! through [`PrimitiveCache`] and [`EdgeCache`], so adjacent triangles end up
//! referencing the same `EDGE_CURVE` with opposite orientation flags.

use stlstep_math::{direction_between, unit_cross, Dir3, Point3, Tolerance, Vec3};
use tracing::{debug, info, warn};

use crate::cache::{EdgeCache, PrimitiveCache};
use crate::entities::{
    AxisPlacement3D, EntityData, EntityGraph, EntityIndex, EdgeLoop, Face, FaceBound,
    ManifoldShape, OrientedEdge, Plane, Shell, ShellModel,
};
use crate::error::{Result, StepError};

/// Doubles per triangle: three vertices of `(x, y, z)`.
pub const TRIANGLE_STRIDE: usize = 9;

/// Counters collected while building a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Complete triangles in the input.
    pub triangles: usize,
    /// Faces emitted.
    pub faces: usize,
    /// Degenerate triangles dropped.
    pub skipped_triangles: usize,
    /// Distinct vertices created.
    pub vertices: usize,
    /// Distinct edges created.
    pub unique_edges: usize,
    /// Edge lookups that reused an existing edge.
    pub merged_edges: usize,
}

/// Result of [`BodyBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuiltBody {
    /// All entities of the body, in id order.
    pub graph: EntityGraph,
    /// The `MANIFOLD_SURFACE_SHAPE_REPRESENTATION` root.
    pub root: EntityIndex,
    /// Build counters.
    pub stats: BuildStats,
}

/// Builds one STEP body from a flat triangle list.
#[derive(Debug)]
pub struct BodyBuilder {
    graph: EntityGraph,
    primitives: PrimitiveCache,
    edges: EdgeCache,
    faces: Vec<EntityIndex>,
    skipped: usize,
}

impl BodyBuilder {
    /// Create a builder; the tolerance must be finite and positive.
    pub fn new(tolerance: f64) -> Result<Self> {
        let tol = Tolerance::new(tolerance).ok_or(StepError::InvalidTolerance(tolerance))?;
        Ok(Self::with_tolerance(tol))
    }

    /// Create a builder from an already validated tolerance.
    pub fn with_tolerance(tol: Tolerance) -> Self {
        Self {
            graph: EntityGraph::new(),
            primitives: PrimitiveCache::new(tol),
            edges: EdgeCache::new(),
            faces: Vec::new(),
            skipped: 0,
        }
    }

    /// Build the body for `triangles` (`9 * n` doubles).
    ///
    /// Degenerate triangles are skipped. Trailing values that do not form a
    /// whole triangle are ignored.
    pub fn build(mut self, triangles: &[f64]) -> BuiltBody {
        let remainder = triangles.len() % TRIANGLE_STRIDE;
        if remainder != 0 {
            warn!(
                values = triangles.len(),
                ignored = remainder,
                "triangle list length is not a multiple of 9"
            );
        }

        let chunks = triangles.chunks_exact(TRIANGLE_STRIDE);
        let count = chunks.len();
        for (i, t) in chunks.enumerate() {
            let p0 = Point3::new(t[0], t[1], t[2]);
            let p1 = Point3::new(t[3], t[4], t[5]);
            let p2 = Point3::new(t[6], t[7], t[8]);
            if let Some(face) = self.add_triangle(&p0, &p1, &p2) {
                self.faces.push(face);
            } else {
                debug!(triangle = i, "skipping degenerate triangle");
                self.skipped += 1;
            }
        }

        let faces = self.faces.len();
        let root = self.finish_root();
        let stats = BuildStats {
            triangles: count,
            faces,
            skipped_triangles: self.skipped,
            vertices: self.primitives.vertex_count(),
            unique_edges: self.edges.len(),
            merged_edges: self.edges.merged_count(),
        };
        info!(
            triangles = stats.triangles,
            faces = stats.faces,
            skipped = stats.skipped_triangles,
            vertices = stats.vertices,
            edges = stats.unique_edges,
            merged = stats.merged_edges,
            entities = self.graph.len(),
            "built STEP body"
        );
        BuiltBody {
            graph: self.graph,
            root,
            stats,
        }
    }

    /// Emit one planar face, or `None` if the triangle is degenerate.
    fn add_triangle(&mut self, p0: &Point3, p1: &Point3, p2: &Point3) -> Option<EntityIndex> {
        let tol = self.primitives.tolerance();
        let (d0, _) = direction_between(p0, p1, &tol)?;
        let (d1, _) = direction_between(p0, p2, &tol)?;
        let normal = unit_cross(&d0, &d1, &tol)?;

        // Corners that pass the distance checks can still share a lattice
        // cell and would collapse an edge onto one vertex.
        let (k0, k1, k2) = (
            tol.quantize_point(p0),
            tol.quantize_point(p1),
            tol.quantize_point(p2),
        );
        if k0 == k1 || k1 == k2 || k2 == k0 {
            return None;
        }

        let v0 = self.primitives.vertex(&mut self.graph, p0);
        let v1 = self.primitives.vertex(&mut self.graph, p1);
        let v2 = self.primitives.vertex(&mut self.graph, p2);

        let mut loop_edges = Vec::with_capacity(3);
        for (a, b) in [(&v0, &v1), (&v1, &v2), (&v2, &v0)] {
            let (edge, forward) = self
                .edges
                .edge(&mut self.graph, &mut self.primitives, a, b);
            loop_edges.push(self.graph.add(EntityData::OrientedEdge(OrientedEdge {
                edge: Some(edge),
                orientation: forward,
            })));
        }

        let edge_loop = self
            .graph
            .add(EntityData::EdgeLoop(EdgeLoop { edges: loop_edges }));
        let bound = self.graph.add(EntityData::FaceBound(FaceBound {
            bound: Some(edge_loop),
            orientation: true,
            is_outer: false,
        }));
        let placement = self.placement(p0, &normal, &d0);
        let plane = self.graph.add(EntityData::Plane(Plane {
            placement: Some(placement),
        }));
        Some(self.graph.add(EntityData::Face(Face {
            bounds: vec![bound],
            surface: Some(plane),
            same_sense: true,
        })))
    }

    fn placement(&mut self, origin: &Point3, axis: &Dir3, reference: &Dir3) -> EntityIndex {
        let location = self.primitives.point(&mut self.graph, origin);
        let axis = self.primitives.direction(&mut self.graph, axis);
        let ref_direction = self.primitives.direction(&mut self.graph, reference);
        self.graph.add(EntityData::AxisPlacement3D(AxisPlacement3D {
            location: Some(location),
            axis: Some(axis),
            ref_direction: Some(ref_direction),
        }))
    }

    /// World placement, open shell, shell model and shape representation.
    fn finish_root(&mut self) -> EntityIndex {
        let placement = self.placement(&Point3::origin(), &Vec3::z_axis(), &Vec3::x_axis());
        let shell = self.graph.add(EntityData::Shell(Shell {
            faces: std::mem::take(&mut self.faces),
            is_open: true,
        }));
        let model = self.graph.add(EntityData::ShellModel(ShellModel {
            shells: vec![shell],
        }));
        self.graph.add(EntityData::ManifoldShape(ManifoldShape {
            placement: Some(placement),
            model: Some(model),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityKind;

    fn faces_of(body: &BuiltBody) -> Vec<&Face> {
        body.graph
            .iter()
            .filter_map(|(_, e)| match &e.data {
                EntityData::Face(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    /// Two triangles sharing the (1,0,0)-(0,1,0) diagonal of a unit square.
    const SQUARE: [f64; 18] = [
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
        1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
    ];

    fn tetrahedron() -> Vec<f64> {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        let d = [0.0, 0.0, 1.0];
        [[a, c, b], [a, b, d], [b, c, d], [c, a, d]]
            .iter()
            .flat_map(|t| t.iter().flatten().copied())
            .collect()
    }

    fn cube() -> Vec<f64> {
        let v = |x: f64, y: f64, z: f64| [x, y, z];
        let p = [
            v(0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0),
            v(1.0, 1.0, 0.0),
            v(0.0, 1.0, 0.0),
            v(0.0, 0.0, 1.0),
            v(1.0, 0.0, 1.0),
            v(1.0, 1.0, 1.0),
            v(0.0, 1.0, 1.0),
        ];
        // Outward-wound quads, split along a diagonal.
        let quads = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [1, 2, 6, 5],
            [0, 4, 7, 3],
        ];
        let mut out = Vec::new();
        for q in quads {
            for tri in [[q[0], q[1], q[2]], [q[0], q[2], q[3]]] {
                for i in tri {
                    out.extend_from_slice(&p[i]);
                }
            }
        }
        out
    }

    #[test]
    fn test_invalid_tolerance() {
        assert!(matches!(
            BodyBuilder::new(0.0),
            Err(StepError::InvalidTolerance(_))
        ));
        assert!(BodyBuilder::new(-1.0).is_err());
        assert!(BodyBuilder::new(f64::NAN).is_err());
    }

    #[test]
    fn test_two_triangle_square() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&SQUARE);
        let g = &body.graph;

        assert_eq!(g.count(EntityKind::CartesianPoint), 4);
        assert_eq!(g.count(EntityKind::Vertex), 4);
        assert_eq!(body.stats.vertices, 4);
        assert_eq!(g.count(EntityKind::EdgeCurve), 5);
        assert_eq!(body.stats.unique_edges, 5);
        assert_eq!(body.stats.merged_edges, 1);
        assert_eq!(g.count(EntityKind::Face), 2);
        assert_eq!(g.count(EntityKind::Shell), 1);
        assert_eq!(g.count(EntityKind::ShellModel), 1);
        assert_eq!(g.count(EntityKind::ManifoldShape), 1);
        assert_eq!(g.get(body.root).kind(), EntityKind::ManifoldShape);
        assert_eq!(body.root.position(), g.len() - 1);
    }

    #[test]
    fn test_shared_edge_has_opposite_orientations() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&SQUARE);
        let g = &body.graph;

        let mut uses: std::collections::HashMap<EntityIndex, Vec<bool>> = Default::default();
        for (_, e) in g.iter() {
            if let EntityData::OrientedEdge(oe) = &e.data {
                uses.entry(oe.edge.unwrap()).or_default().push(oe.orientation);
            }
        }
        let shared: Vec<_> = uses.values().filter(|u| u.len() == 2).collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0], &vec![true, false]);
    }

    #[test]
    fn test_face_loop_follows_winding() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&SQUARE[..9]);
        let g = &body.graph;
        let face = faces_of(&body)[0];
        let EntityData::FaceBound(bound) = &g.get(face.bounds[0]).data else {
            panic!("expected face bound");
        };
        let EntityData::EdgeLoop(lp) = &g.get(bound.bound.unwrap()).data else {
            panic!("expected edge loop");
        };
        let starts: Vec<Point3> = lp
            .edges
            .iter()
            .map(|&oe| {
                let EntityData::OrientedEdge(oe) = &g.get(oe).data else {
                    panic!("expected oriented edge");
                };
                let EntityData::EdgeCurve(ec) = &g.get(oe.edge.unwrap()).data else {
                    panic!("expected edge curve");
                };
                g.vertex_position(ec.start.unwrap()).unwrap()
            })
            .collect();
        assert_eq!(
            starts,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_face_plane_placement() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&SQUARE[..9]);
        let g = &body.graph;
        let face = faces_of(&body)[0];
        let EntityData::Plane(plane) = &g.get(face.surface.unwrap()).data else {
            panic!("expected plane");
        };
        let EntityData::AxisPlacement3D(ax) = &g.get(plane.placement.unwrap()).data else {
            panic!("expected placement");
        };
        let dir = |i: EntityIndex| match &g.get(i).data {
            EntityData::Direction(d) => (d.x, d.y, d.z),
            other => panic!("expected direction, got {other:?}"),
        };
        assert_eq!(g.point(ax.location.unwrap()), Some(Point3::origin()));
        assert_eq!(dir(ax.axis.unwrap()), (0.0, 0.0, 1.0));
        assert_eq!(dir(ax.ref_direction.unwrap()), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_degenerate_triangles_skipped() {
        let tris = [
            // coincident p0/p1
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            // collinear
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, //
            // coincident p0/p2
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        let body = BodyBuilder::new(1e-6).unwrap().build(&tris);
        assert_eq!(body.stats.triangles, 3);
        assert_eq!(body.stats.skipped_triangles, 3);
        assert_eq!(body.stats.faces, 0);
        assert_eq!(body.graph.count(EntityKind::Face), 0);
        assert_eq!(body.graph.count(EntityKind::Shell), 1);
    }

    #[test]
    fn test_partial_triangle_ignored() {
        let mut tris = SQUARE[..9].to_vec();
        tris.extend_from_slice(&[5.0, 5.0, 5.0, 6.0]);
        let body = BodyBuilder::new(1e-6).unwrap().build(&tris);
        assert_eq!(body.stats.triangles, 1);
        assert_eq!(body.stats.faces, 1);
    }

    #[test]
    fn test_empty_input_still_has_root() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&[]);
        assert_eq!(body.stats, BuildStats::default());
        assert_eq!(body.graph.get(body.root).kind(), EntityKind::ManifoldShape);
    }

    #[test]
    fn test_closed_tetrahedron_merge_count() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&tetrahedron());
        assert_eq!(body.stats.faces, 4);
        assert_eq!(body.stats.unique_edges, 6);
        assert_eq!(body.stats.merged_edges, 3 * 4 - 6);
    }

    #[test]
    fn test_closed_cube_merge_count() {
        let body = BodyBuilder::new(1e-6).unwrap().build(&cube());
        let faces = body.stats.faces;
        assert_eq!(faces, 12);
        assert_eq!(body.stats.unique_edges, 3 * faces / 2);
        assert_eq!(body.stats.merged_edges, 3 * faces - body.stats.unique_edges);
        assert_eq!(body.graph.count(EntityKind::Vertex), 8);
    }

    #[test]
    fn test_near_duplicate_vertices_merge() {
        let mut tris = SQUARE.to_vec();
        tris[9] += 1e-9; // second triangle's (1,0,0)
        let body = BodyBuilder::new(1e-6).unwrap().build(&tris);
        assert_eq!(body.graph.count(EntityKind::Vertex), 4);
        assert_eq!(body.stats.merged_edges, 1);
    }

    #[test]
    fn test_corners_sharing_a_lattice_cell_skipped() {
        // p1 and p2 are ~1.7e-6 apart but both round to the origin cell.
        let h = 0.49e-6;
        let tris = [1e-5, 0.0, 0.0, -h, -h, -h, h, h, h];
        let body = BodyBuilder::new(1e-6).unwrap().build(&tris);
        assert_eq!(body.stats.faces, 0);
        assert_eq!(body.stats.skipped_triangles, 1);
        assert_eq!(body.stats.vertices, 0);
        assert_eq!(body.graph.count(EntityKind::EdgeCurve), 0);
        assert_eq!(body.graph.count(EntityKind::Vertex), 0);
    }

    #[test]
    fn test_non_finite_triangle_does_not_touch_neighbours() {
        let valid = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        let mut tris = vec![f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        tris.extend_from_slice(&[0.0, f64::INFINITY, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        tris.extend_from_slice(&valid);

        let mixed = BodyBuilder::new(1e-6).unwrap().build(&tris);
        let clean = BodyBuilder::new(1e-6).unwrap().build(&valid);

        assert_eq!(mixed.stats.faces, 1);
        assert_eq!(mixed.stats.skipped_triangles, 2);
        assert_eq!(mixed.graph.len(), clean.graph.len());
        for (index, _) in clean.graph.iter() {
            assert_eq!(mixed.graph.entity_line(index), clean.graph.entity_line(index));
        }
        for (_, e) in mixed.graph.iter() {
            if let EntityData::Direction(d) = &e.data {
                assert_ne!((d.x, d.y, d.z), (0.0, 0.0, 0.0));
            }
        }
    }
}
