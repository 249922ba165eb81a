//! Topological entities: vertices, edges, loops, faces, shells and the root
//! shape representation.

use super::{parse_logical, ArgWriter, EntityIndex, EntityKind, Resolver};
use crate::parser::StepValue;

/// Curve kinds an `EDGE_CURVE` may carry.
const EDGE_GEOMETRY: &[EntityKind] = &[EntityKind::SurfaceCurve, EntityKind::Line];

/// `VERTEX_POINT('', #point)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexPoint {
    /// Vertex location.
    pub point: Option<EntityIndex>,
}

impl VertexPoint {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.point);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.point = r.reference(args.get(1), &[EntityKind::CartesianPoint]);
    }
}

/// `EDGE_CURVE('', #v1, #v2, #curve, .T.)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeCurve {
    /// Start vertex.
    pub start: Option<EntityIndex>,
    /// End vertex.
    pub end: Option<EntityIndex>,
    /// Edge geometry (`SURFACE_CURVE` or `LINE`).
    pub curve: Option<EntityIndex>,
    /// Whether the edge runs along the curve direction.
    pub same_sense: bool,
}

impl EdgeCurve {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.start);
        out.reference(self.end);
        out.reference(self.curve);
        out.logical(self.same_sense);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.start = r.reference(args.get(1), &[EntityKind::Vertex]);
        self.end = r.reference(args.get(2), &[EntityKind::Vertex]);
        self.curve = r.reference(args.get(3), EDGE_GEOMETRY);
        self.same_sense = parse_logical(args.get(4));
    }
}

/// `ORIENTED_EDGE('', *, *, #edge, .T.)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientedEdge {
    /// Underlying edge.
    pub edge: Option<EntityIndex>,
    /// `true` when traversed start → end.
    pub orientation: bool,
}

impl OrientedEdge {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.derived();
        out.derived();
        out.reference(self.edge);
        out.logical(self.orientation);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.edge = r.reference(args.get(3), &[EntityKind::EdgeCurve]);
        self.orientation = parse_logical(args.get(4));
    }
}

/// `EDGE_LOOP('', (#a, #b, #c))`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeLoop {
    /// Oriented edges in traversal order.
    pub edges: Vec<EntityIndex>,
}

impl EdgeLoop {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference_list(self.edges.iter().copied().map(Some));
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.edges = r.reference_list(args.get(1), &[EntityKind::OrientedEdge]);
    }
}

/// `FACE_BOUND('', #loop, .T.)` or `FACE_OUTER_BOUND(...)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceBound {
    /// Bounding loop.
    pub bound: Option<EntityIndex>,
    /// Loop orientation relative to the face.
    pub orientation: bool,
    /// Read from (and written back as) `FACE_OUTER_BOUND`.
    pub is_outer: bool,
}

impl FaceBound {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.bound);
        out.logical(self.orientation);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.bound = r.reference(args.get(1), &[EntityKind::EdgeLoop]);
        self.orientation = parse_logical(args.get(2));
    }
}

/// `ADVANCED_FACE('', (#bound), #plane, .T.)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Face {
    /// Face bounds.
    pub bounds: Vec<EntityIndex>,
    /// Underlying plane.
    pub surface: Option<EntityIndex>,
    /// Whether the face normal agrees with the surface normal.
    pub same_sense: bool,
}

impl Face {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference_list(self.bounds.iter().copied().map(Some));
        out.reference(self.surface);
        out.logical(self.same_sense);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.bounds = r.reference_list(args.get(1), &[EntityKind::FaceBound]);
        self.surface = r.reference(args.get(2), &[EntityKind::Plane]);
        self.same_sense = parse_logical(args.get(3));
    }
}

/// `OPEN_SHELL('', (#f1, #f2))` or `CLOSED_SHELL(...)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shell {
    /// Faces of the shell.
    pub faces: Vec<EntityIndex>,
    /// `OPEN_SHELL` when set, `CLOSED_SHELL` otherwise.
    pub is_open: bool,
}

impl Shell {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference_list(self.faces.iter().copied().map(Some));
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.faces = r.reference_list(args.get(1), &[EntityKind::Face]);
    }
}

/// `SHELL_BASED_SURFACE_MODEL('', (#shell))`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellModel {
    /// Shells of the model.
    pub shells: Vec<EntityIndex>,
}

impl ShellModel {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference_list(self.shells.iter().copied().map(Some));
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.shells = r.reference_list(args.get(1), &[EntityKind::Shell]);
    }
}

/// `MANIFOLD_SURFACE_SHAPE_REPRESENTATION('', (#placement, #model))`
///
/// On read, the first placement and the first shell model found in the item
/// list are taken, in any order; a trailing context argument is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManifoldShape {
    /// Coordinate system of the representation.
    pub placement: Option<EntityIndex>,
    /// Surface model.
    pub model: Option<EntityIndex>,
}

impl ManifoldShape {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference_list([self.placement, self.model]);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        let items = r.reference_list(
            args.get(1),
            &[EntityKind::AxisPlacement3D, EntityKind::ShellModel],
        );
        for index in items {
            match r.kind(index) {
                EntityKind::AxisPlacement3D if self.placement.is_none() => {
                    self.placement = Some(index);
                }
                EntityKind::ShellModel if self.model.is_none() => self.model = Some(index),
                _ => {}
            }
        }
    }
}
