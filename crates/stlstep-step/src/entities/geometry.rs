//! Geometric entities: points, directions, placements, lines and planes.

use stlstep_math::{Dir3, Point3};

use super::{parse_triple, ArgWriter, EntityIndex, EntityKind, Resolver};
use crate::parser::StepValue;

/// `CARTESIAN_POINT('', (x, y, z))`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartesianPoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl CartesianPoint {
    /// Create a point from coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert to a math point.
    pub fn to_point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.triple(self.x, self.y, self.z);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue]) {
        let [x, y, z] = parse_triple(args.get(1));
        *self = Self { x, y, z };
    }
}

impl From<Point3> for CartesianPoint {
    fn from(p: Point3) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

/// `DIRECTION('', (x, y, z))`
///
/// Unit length when produced by the builder; not enforced when read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Direction {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Direction {
    /// Create a direction from components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.triple(self.x, self.y, self.z);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue]) {
        let [x, y, z] = parse_triple(args.get(1));
        *self = Self { x, y, z };
    }
}

impl From<Dir3> for Direction {
    fn from(d: Dir3) -> Self {
        Self::new(d.x, d.y, d.z)
    }
}

/// `AXIS2_PLACEMENT_3D('', #origin, #axis, #ref)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisPlacement3D {
    /// Origin point.
    pub location: Option<EntityIndex>,
    /// Z axis direction.
    pub axis: Option<EntityIndex>,
    /// X reference direction.
    pub ref_direction: Option<EntityIndex>,
}

impl AxisPlacement3D {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.location);
        out.reference(self.axis);
        out.reference(self.ref_direction);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.location = r.reference(args.get(1), &[EntityKind::CartesianPoint]);
        self.axis = r.reference(args.get(2), &[EntityKind::Direction]);
        self.ref_direction = r.reference(args.get(3), &[EntityKind::Direction]);
    }
}

/// `VECTOR('', #dir, magnitude)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    /// Direction.
    pub direction: Option<EntityIndex>,
    /// Magnitude in model units.
    pub magnitude: f64,
}

impl Vector {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.direction);
        out.real(self.magnitude);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.direction = r.reference(args.get(1), &[EntityKind::Direction]);
        self.magnitude = args.get(2).and_then(StepValue::as_real).unwrap_or(0.0);
    }
}

/// `LINE('', #point, #vector)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Line {
    /// Point on the line.
    pub point: Option<EntityIndex>,
    /// Line direction and parameter scale.
    pub vector: Option<EntityIndex>,
}

impl Line {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.point);
        out.reference(self.vector);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.point = r.reference(args.get(1), &[EntityKind::CartesianPoint]);
        self.vector = r.reference(args.get(2), &[EntityKind::Vector]);
    }
}

/// `SURFACE_CURVE('', #line)`
///
/// Only the 3D curve is kept; pcurve lists and the representation flag of a
/// full `SURFACE_CURVE` record are ignored on read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceCurve {
    /// Underlying 3D curve.
    pub curve: Option<EntityIndex>,
}

impl SurfaceCurve {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.curve);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.curve = r.reference(args.get(1), &[EntityKind::Line]);
    }
}

/// `PLANE('', #placement)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane {
    /// Placement whose XY plane is the surface.
    pub placement: Option<EntityIndex>,
}

impl Plane {
    pub(crate) fn write_args(&self, out: &mut ArgWriter<'_>) {
        out.reference(self.placement);
    }

    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        self.placement = r.reference(args.get(1), &[EntityKind::AxisPlacement3D]);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{EntityData, EntityGraph};
    use super::*;

    fn point(graph: &mut EntityGraph, x: f64, y: f64, z: f64) -> EntityIndex {
        graph.add(EntityData::CartesianPoint(CartesianPoint::new(x, y, z)))
    }

    #[test]
    fn test_point_line() {
        let mut graph = EntityGraph::new();
        let p = point(&mut graph, 0.0, -1.5, 1e-7);
        assert_eq!(
            graph.entity_line(p),
            "#1 = CARTESIAN_POINT('', (0.0, -1.5, 1.0E-7));"
        );
    }

    #[test]
    fn test_placement_and_plane_lines() {
        let mut graph = EntityGraph::new();
        let origin = point(&mut graph, 0.0, 0.0, 0.0);
        let z = graph.add(EntityData::Direction(Direction::new(0.0, 0.0, 1.0)));
        let x = graph.add(EntityData::Direction(Direction::new(1.0, 0.0, 0.0)));
        let placement = graph.add(EntityData::AxisPlacement3D(AxisPlacement3D {
            location: Some(origin),
            axis: Some(z),
            ref_direction: Some(x),
        }));
        let plane = graph.add(EntityData::Plane(Plane {
            placement: Some(placement),
        }));
        assert_eq!(
            graph.entity_line(placement),
            "#4 = AXIS2_PLACEMENT_3D('', #1, #2, #3);"
        );
        assert_eq!(graph.entity_line(plane), "#5 = PLANE('', #4);");
    }

    #[test]
    fn test_line_vector_surface_curve_lines() {
        let mut graph = EntityGraph::new();
        let p = point(&mut graph, 0.0, 0.0, 0.0);
        let d = graph.add(EntityData::Direction(Direction::new(0.0, 1.0, 0.0)));
        let v = graph.add(EntityData::Vector(Vector {
            direction: Some(d),
            magnitude: 1.0,
        }));
        let line = graph.add(EntityData::Line(Line {
            point: Some(p),
            vector: Some(v),
        }));
        let curve = graph.add(EntityData::SurfaceCurve(SurfaceCurve { curve: Some(line) }));
        assert_eq!(graph.entity_line(v), "#3 = VECTOR('', #2, 1.0);");
        assert_eq!(graph.entity_line(line), "#4 = LINE('', #1, #3);");
        assert_eq!(graph.entity_line(curve), "#5 = SURFACE_CURVE('', #4);");
    }

    #[test]
    fn test_unresolved_reference_written_as_null() {
        let mut graph = EntityGraph::new();
        let plane = graph.add(EntityData::Plane(Plane::default()));
        assert_eq!(graph.entity_line(plane), "#1 = PLANE('', $);");
    }
}
