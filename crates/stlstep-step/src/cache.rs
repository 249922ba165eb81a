//! Tolerance-keyed deduplication of points, directions, vertices and edges.
//!
//! Coordinates are quantized onto the tolerance lattice ([`QuantKey`]) so
//! "within tolerance" becomes exact hash-map equality. Entries are never
//! evicted: a cache lives exactly as long as one body build.

use std::collections::HashMap;

use stlstep_math::{direction_between, Dir3, Point3, QuantKey, Tolerance, Vec3};
use tracing::trace;

use crate::entities::{
    CartesianPoint, Direction, EdgeCurve, EntityData, EntityGraph, EntityIndex, Line,
    SurfaceCurve, Vector, VertexPoint,
};

/// A vertex returned by [`PrimitiveCache::vertex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedVertex {
    /// The `VERTEX_POINT` entity.
    pub index: EntityIndex,
    /// Quantized location, used to build edge keys.
    pub key: QuantKey,
    /// Location of the first vertex created for this key.
    pub position: Point3,
}

/// Ordered pair of vertex keys identifying a directed edge.
type EdgeKey = (QuantKey, QuantKey);

/// Deduplicating factory for points, directions and vertices.
#[derive(Debug)]
pub struct PrimitiveCache {
    tol: Tolerance,
    points: HashMap<QuantKey, EntityIndex>,
    directions: HashMap<QuantKey, EntityIndex>,
    vertices: HashMap<QuantKey, CachedVertex>,
}

impl PrimitiveCache {
    /// Create an empty cache with a fixed tolerance.
    pub fn new(tol: Tolerance) -> Self {
        Self {
            tol,
            points: HashMap::new(),
            directions: HashMap::new(),
            vertices: HashMap::new(),
        }
    }

    /// Tolerance the cache quantizes with.
    pub fn tolerance(&self) -> Tolerance {
        self.tol
    }

    /// `CARTESIAN_POINT` at `p`, created on first request.
    pub fn point(&mut self, graph: &mut EntityGraph, p: &Point3) -> EntityIndex {
        let key = self.tol.quantize_point(p);
        *self.points.entry(key).or_insert_with(|| {
            graph.add(EntityData::CartesianPoint(CartesianPoint::from(*p)))
        })
    }

    /// `DIRECTION` along `d`, created on first request.
    pub fn direction(&mut self, graph: &mut EntityGraph, d: &Dir3) -> EntityIndex {
        let key = self.tol.quantize(d.x, d.y, d.z);
        *self
            .directions
            .entry(key)
            .or_insert_with(|| graph.add(EntityData::Direction(Direction::from(*d))))
    }

    /// `VERTEX_POINT` at `p`, sharing the `CARTESIAN_POINT` of [`Self::point`].
    pub fn vertex(&mut self, graph: &mut EntityGraph, p: &Point3) -> CachedVertex {
        let key = self.tol.quantize_point(p);
        if let Some(v) = self.vertices.get(&key) {
            return *v;
        }
        let point = self.point(graph, p);
        let index = graph.add(EntityData::Vertex(VertexPoint { point: Some(point) }));
        let vertex = CachedVertex {
            index,
            key,
            position: *p,
        };
        self.vertices.insert(key, vertex);
        vertex
    }

    /// Number of distinct vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Shares `EDGE_CURVE`s between faces that traverse the same vertex pair.
#[derive(Debug, Default)]
pub struct EdgeCache {
    edges: HashMap<EdgeKey, EntityIndex>,
    merged: usize,
}

impl EdgeCache {
    /// Create an empty edge cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge from `a` to `b`, plus whether it is used in its stored direction.
    ///
    /// A hit on either direction reuses the edge and counts one merge. A miss
    /// creates `LINE` + `VECTOR` + `SURFACE_CURVE` + `EDGE_CURVE` and stores
    /// the edge under the forward key only.
    pub fn edge(
        &mut self,
        graph: &mut EntityGraph,
        primitives: &mut PrimitiveCache,
        a: &CachedVertex,
        b: &CachedVertex,
    ) -> (EntityIndex, bool) {
        let forward = (a.key, b.key);
        if let Some(&edge) = self.edges.get(&forward) {
            self.merged += 1;
            return (edge, true);
        }
        if let Some(&edge) = self.edges.get(&(b.key, a.key)) {
            self.merged += 1;
            trace!(edge = graph.id_of(edge), "reusing edge in reverse");
            return (edge, false);
        }

        let curve = Self::line_curve(graph, primitives, &a.position, &b.position);
        let edge = graph.add(EntityData::EdgeCurve(EdgeCurve {
            start: Some(a.index),
            end: Some(b.index),
            curve: Some(curve),
            same_sense: true,
        }));
        self.edges.insert(forward, edge);
        (edge, true)
    }

    /// `SURFACE_CURVE` over a `LINE` through `from` towards `to`.
    fn line_curve(
        graph: &mut EntityGraph,
        primitives: &mut PrimitiveCache,
        from: &Point3,
        to: &Point3,
    ) -> EntityIndex {
        let tol = primitives.tolerance();
        // Zero-length edges only come from callers that skipped the
        // degenerate check; they get an arbitrary +X direction.
        let dir = direction_between(from, to, &tol)
            .map(|(d, _)| d)
            .unwrap_or_else(Vec3::x_axis);
        let point = primitives.point(graph, from);
        let direction = primitives.direction(graph, &dir);
        let vector = graph.add(EntityData::Vector(Vector {
            direction: Some(direction),
            magnitude: 1.0,
        }));
        let line = graph.add(EntityData::Line(Line {
            point: Some(point),
            vector: Some(vector),
        }));
        graph.add(EntityData::SurfaceCurve(SurfaceCurve { curve: Some(line) }))
    }

    /// Number of lookups that reused an existing edge.
    pub fn merged_count(&self) -> usize {
        self.merged
    }

    /// Number of distinct edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no edge has been created yet.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
