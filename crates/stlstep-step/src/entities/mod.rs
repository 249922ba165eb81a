//! STEP entity types and the entity graph arena.
//!
//! Every record in a STEP data section is one [`Entity`]: an id, a label and
//! one of the closed set of [`EntityData`] variants this crate understands.
//! Entities reference each other through [`EntityIndex`] handles into the
//! owning [`EntityGraph`]; `#id` text only exists at the file boundary.

pub mod geometry;
pub mod topology;

pub use geometry::*;
pub use topology::*;

use std::collections::HashMap;
use std::fmt::Write as _;

use stlstep_math::Point3;
use tracing::warn;

use crate::parser::StepValue;

/// Handle of an entity inside its [`EntityGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIndex(usize);

impl EntityIndex {
    /// Position of the entity in graph order (0-based).
    pub fn position(self) -> usize {
        self.0
    }
}

/// Tag of an entity variant, used for keyword dispatch and type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// `CARTESIAN_POINT`
    CartesianPoint,
    /// `DIRECTION`
    Direction,
    /// `AXIS2_PLACEMENT_3D`
    AxisPlacement3D,
    /// `VECTOR`
    Vector,
    /// `LINE`
    Line,
    /// `SURFACE_CURVE`
    SurfaceCurve,
    /// `VERTEX_POINT`
    Vertex,
    /// `EDGE_CURVE`
    EdgeCurve,
    /// `ORIENTED_EDGE`
    OrientedEdge,
    /// `EDGE_LOOP`
    EdgeLoop,
    /// `FACE_BOUND` / `FACE_OUTER_BOUND`
    FaceBound,
    /// `PLANE`
    Plane,
    /// `ADVANCED_FACE` / `FACE_SURFACE`
    Face,
    /// `OPEN_SHELL` / `CLOSED_SHELL`
    Shell,
    /// `SHELL_BASED_SURFACE_MODEL`
    ShellModel,
    /// `MANIFOLD_SURFACE_SHAPE_REPRESENTATION`
    ManifoldShape,
}

/// Keyword table accepted on read. Alternate spellings map to one kind.
const KEYWORDS: &[(&str, EntityKind)] = &[
    ("CARTESIAN_POINT", EntityKind::CartesianPoint),
    ("DIRECTION", EntityKind::Direction),
    ("AXIS2_PLACEMENT_3D", EntityKind::AxisPlacement3D),
    ("PLANE", EntityKind::Plane),
    ("EDGE_LOOP", EntityKind::EdgeLoop),
    ("FACE_BOUND", EntityKind::FaceBound),
    ("FACE_OUTER_BOUND", EntityKind::FaceBound),
    ("ADVANCED_FACE", EntityKind::Face),
    ("FACE_SURFACE", EntityKind::Face),
    ("OPEN_SHELL", EntityKind::Shell),
    ("CLOSED_SHELL", EntityKind::Shell),
    ("SHELL_BASED_SURFACE_MODEL", EntityKind::ShellModel),
    ("MANIFOLD_SURFACE_SHAPE_REPRESENTATION", EntityKind::ManifoldShape),
    ("VERTEX_POINT", EntityKind::Vertex),
    ("SURFACE_CURVE", EntityKind::SurfaceCurve),
    ("EDGE_CURVE", EntityKind::EdgeCurve),
    ("ORIENTED_EDGE", EntityKind::OrientedEdge),
    ("VECTOR", EntityKind::Vector),
    ("LINE", EntityKind::Line),
];

impl EntityKind {
    /// Look up a (case-insensitive) STEP keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|&(_, kind)| kind)
    }

    /// Canonical keyword written for this kind.
    ///
    /// Kinds with two spellings pick theirs from the entity data, see
    /// [`EntityData::keyword`].
    pub fn keyword(self) -> &'static str {
        match self {
            EntityKind::CartesianPoint => "CARTESIAN_POINT",
            EntityKind::Direction => "DIRECTION",
            EntityKind::AxisPlacement3D => "AXIS2_PLACEMENT_3D",
            EntityKind::Vector => "VECTOR",
            EntityKind::Line => "LINE",
            EntityKind::SurfaceCurve => "SURFACE_CURVE",
            EntityKind::Vertex => "VERTEX_POINT",
            EntityKind::EdgeCurve => "EDGE_CURVE",
            EntityKind::OrientedEdge => "ORIENTED_EDGE",
            EntityKind::EdgeLoop => "EDGE_LOOP",
            EntityKind::FaceBound => "FACE_BOUND",
            EntityKind::Plane => "PLANE",
            EntityKind::Face => "ADVANCED_FACE",
            EntityKind::Shell => "OPEN_SHELL",
            EntityKind::ShellModel => "SHELL_BASED_SURFACE_MODEL",
            EntityKind::ManifoldShape => "MANIFOLD_SURFACE_SHAPE_REPRESENTATION",
        }
    }
}

/// Payload of an entity: one variant per supported STEP record type.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityData {
    /// Point in model space.
    CartesianPoint(CartesianPoint),
    /// Direction vector.
    Direction(Direction),
    /// Right-handed placement (origin, axis, reference direction).
    AxisPlacement3D(AxisPlacement3D),
    /// Direction with magnitude.
    Vector(Vector),
    /// Unbounded line.
    Line(Line),
    /// Curve lying on a surface.
    SurfaceCurve(SurfaceCurve),
    /// Topological vertex.
    Vertex(VertexPoint),
    /// Topological edge with curve geometry.
    EdgeCurve(EdgeCurve),
    /// Edge used in a loop with a traversal direction.
    OrientedEdge(OrientedEdge),
    /// Closed chain of oriented edges.
    EdgeLoop(EdgeLoop),
    /// Loop bounding a face.
    FaceBound(FaceBound),
    /// Planar surface.
    Plane(Plane),
    /// Face with bounds and a surface.
    Face(Face),
    /// Set of connected faces.
    Shell(Shell),
    /// Surface model made of shells.
    ShellModel(ShellModel),
    /// Root shape representation.
    ManifoldShape(ManifoldShape),
}

impl EntityData {
    /// Empty payload of a kind, filled in later by [`EntityData::parse_args`].
    ///
    /// `keyword` selects between alternate spellings (outer bound, closed shell).
    pub fn empty(kind: EntityKind, keyword: &str) -> Self {
        match kind {
            EntityKind::CartesianPoint => Self::CartesianPoint(CartesianPoint::default()),
            EntityKind::Direction => Self::Direction(Direction::default()),
            EntityKind::AxisPlacement3D => Self::AxisPlacement3D(AxisPlacement3D::default()),
            EntityKind::Vector => Self::Vector(Vector::default()),
            EntityKind::Line => Self::Line(Line::default()),
            EntityKind::SurfaceCurve => Self::SurfaceCurve(SurfaceCurve::default()),
            EntityKind::Vertex => Self::Vertex(VertexPoint::default()),
            EntityKind::EdgeCurve => Self::EdgeCurve(EdgeCurve::default()),
            EntityKind::OrientedEdge => Self::OrientedEdge(OrientedEdge::default()),
            EntityKind::EdgeLoop => Self::EdgeLoop(EdgeLoop::default()),
            EntityKind::FaceBound => Self::FaceBound(FaceBound {
                is_outer: keyword.eq_ignore_ascii_case("FACE_OUTER_BOUND"),
                ..FaceBound::default()
            }),
            EntityKind::Plane => Self::Plane(Plane::default()),
            EntityKind::Face => Self::Face(Face::default()),
            EntityKind::Shell => Self::Shell(Shell {
                is_open: !keyword.eq_ignore_ascii_case("CLOSED_SHELL"),
                ..Shell::default()
            }),
            EntityKind::ShellModel => Self::ShellModel(ShellModel::default()),
            EntityKind::ManifoldShape => Self::ManifoldShape(ManifoldShape::default()),
        }
    }

    /// Variant tag.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::CartesianPoint(_) => EntityKind::CartesianPoint,
            Self::Direction(_) => EntityKind::Direction,
            Self::AxisPlacement3D(_) => EntityKind::AxisPlacement3D,
            Self::Vector(_) => EntityKind::Vector,
            Self::Line(_) => EntityKind::Line,
            Self::SurfaceCurve(_) => EntityKind::SurfaceCurve,
            Self::Vertex(_) => EntityKind::Vertex,
            Self::EdgeCurve(_) => EntityKind::EdgeCurve,
            Self::OrientedEdge(_) => EntityKind::OrientedEdge,
            Self::EdgeLoop(_) => EntityKind::EdgeLoop,
            Self::FaceBound(_) => EntityKind::FaceBound,
            Self::Plane(_) => EntityKind::Plane,
            Self::Face(_) => EntityKind::Face,
            Self::Shell(_) => EntityKind::Shell,
            Self::ShellModel(_) => EntityKind::ShellModel,
            Self::ManifoldShape(_) => EntityKind::ManifoldShape,
        }
    }

    /// Keyword written for this payload.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::FaceBound(b) if b.is_outer => "FACE_OUTER_BOUND",
            Self::Shell(s) if !s.is_open => "CLOSED_SHELL",
            other => other.kind().keyword(),
        }
    }

    /// Append the argument list (after the label) to `out`.
    fn write_args(&self, out: &mut ArgWriter<'_>) {
        match self {
            Self::CartesianPoint(e) => e.write_args(out),
            Self::Direction(e) => e.write_args(out),
            Self::AxisPlacement3D(e) => e.write_args(out),
            Self::Vector(e) => e.write_args(out),
            Self::Line(e) => e.write_args(out),
            Self::SurfaceCurve(e) => e.write_args(out),
            Self::Vertex(e) => e.write_args(out),
            Self::EdgeCurve(e) => e.write_args(out),
            Self::OrientedEdge(e) => e.write_args(out),
            Self::EdgeLoop(e) => e.write_args(out),
            Self::FaceBound(e) => e.write_args(out),
            Self::Plane(e) => e.write_args(out),
            Self::Face(e) => e.write_args(out),
            Self::Shell(e) => e.write_args(out),
            Self::ShellModel(e) => e.write_args(out),
            Self::ManifoldShape(e) => e.write_args(out),
        }
    }

    /// Fill this payload from parsed arguments (`args[0]` is the label).
    pub(crate) fn parse_args(&mut self, args: &[StepValue], r: &Resolver<'_>) {
        match self {
            Self::CartesianPoint(e) => e.parse_args(args),
            Self::Direction(e) => e.parse_args(args),
            Self::AxisPlacement3D(e) => e.parse_args(args, r),
            Self::Vector(e) => e.parse_args(args, r),
            Self::Line(e) => e.parse_args(args, r),
            Self::SurfaceCurve(e) => e.parse_args(args, r),
            Self::Vertex(e) => e.parse_args(args, r),
            Self::EdgeCurve(e) => e.parse_args(args, r),
            Self::OrientedEdge(e) => e.parse_args(args, r),
            Self::EdgeLoop(e) => e.parse_args(args, r),
            Self::FaceBound(e) => e.parse_args(args, r),
            Self::Plane(e) => e.parse_args(args, r),
            Self::Face(e) => e.parse_args(args, r),
            Self::Shell(e) => e.parse_args(args, r),
            Self::ShellModel(e) => e.parse_args(args, r),
            Self::ManifoldShape(e) => e.parse_args(args, r),
        }
    }
}

/// A STEP record: id, free-text label and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Entity id (`#id`), unique within a graph.
    pub id: u64,
    /// Free-text name, usually empty.
    pub label: String,
    /// Typed payload.
    pub data: EntityData,
}

impl Entity {
    /// Variant tag.
    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }
}

/// Append-only arena of entities for one conversion or one read.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    entities: Vec<Entity>,
    by_id: HashMap<u64, EntityIndex>,
    max_id: u64,
}

impl EntityGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity with the next sequential id.
    pub fn add(&mut self, data: EntityData) -> EntityIndex {
        let id = self.max_id + 1;
        self.insert_with_id(id, data)
    }

    /// Register an entity with an explicit id (file id on the read path).
    ///
    /// A repeated id shadows the earlier entity in [`EntityGraph::index_of`];
    /// both stay in graph order.
    pub fn insert_with_id(&mut self, id: u64, data: EntityData) -> EntityIndex {
        let index = EntityIndex(self.entities.len());
        self.entities.push(Entity {
            id,
            label: String::new(),
            data,
        });
        if self.by_id.insert(id, index).is_some() {
            warn!(id, "duplicate entity id, later definition wins");
        }
        self.max_id = self.max_id.max(id);
        index
    }

    /// Entity at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` came from a different graph and is out of range.
    pub fn get(&self, index: EntityIndex) -> &Entity {
        &self.entities[index.0]
    }

    pub(crate) fn get_mut(&mut self, index: EntityIndex) -> &mut Entity {
        &mut self.entities[index.0]
    }

    /// Entity by its `#id`.
    pub fn find(&self, id: u64) -> Option<&Entity> {
        self.index_of(id).map(|i| self.get(i))
    }

    /// Index of the entity with `#id`.
    pub fn index_of(&self, id: u64) -> Option<EntityIndex> {
        self.by_id.get(&id).copied()
    }

    /// `#id` of the entity at `index`.
    pub fn id_of(&self, index: EntityIndex) -> u64 {
        self.get(index).id
    }

    /// Entities in graph (creation or file) order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityIndex, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityIndex(i), e))
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind).count()
    }

    /// Indices of all entities of one kind, in graph order.
    pub fn of_kind(&self, kind: EntityKind) -> Vec<EntityIndex> {
        self.iter()
            .filter(|(_, e)| e.kind() == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Coordinates of a `CARTESIAN_POINT`.
    pub fn point(&self, index: EntityIndex) -> Option<Point3> {
        match &self.get(index).data {
            EntityData::CartesianPoint(p) => Some(p.to_point()),
            _ => None,
        }
    }

    /// Coordinates behind a `VERTEX_POINT`.
    pub fn vertex_position(&self, index: EntityIndex) -> Option<Point3> {
        match &self.get(index).data {
            EntityData::Vertex(v) => v.point.and_then(|p| self.point(p)),
            _ => None,
        }
    }

    /// Serialize one entity as a full data-section line, without newline.
    ///
    /// `#<id> = <KEYWORD>('<label>', <args>);`
    pub fn entity_line(&self, index: EntityIndex) -> String {
        let entity = self.get(index);
        let mut line = String::with_capacity(64);
        let _ = write!(
            line,
            "#{} = {}('{}'",
            entity.id,
            entity.data.keyword(),
            escape_label(&entity.label)
        );
        let mut args = ArgWriter {
            graph: self,
            out: &mut line,
        };
        entity.data.write_args(&mut args);
        line.push_str(");");
        line
    }
}

/// Double single quotes for Part 21 string literals.
fn escape_label(label: &str) -> std::borrow::Cow<'_, str> {
    if label.contains('\'') {
        label.replace('\'', "''").into()
    } else {
        label.into()
    }
}

/// Format a real the way Part 21 expects: shortest round-trip digits, a
/// mandatory decimal point and an upper-case exponent (`1.0`, `1.5E-7`).
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        // Part 21 has no NaN/Inf literal.
        return "0.0".to_string();
    }
    let text = format!("{value:?}");
    let (mantissa, exponent) = match text.split_once('e') {
        Some((m, e)) => (m.to_string(), Some(e.to_string())),
        None => (text, None),
    };
    let mut out = mantissa;
    if !out.contains('.') {
        out.push_str(".0");
    }
    if let Some(exp) = exponent {
        out.push('E');
        out.push_str(&exp);
    }
    out
}

/// Writes `, arg` fragments of one entity line.
pub(crate) struct ArgWriter<'a> {
    graph: &'a EntityGraph,
    out: &'a mut String,
}

impl ArgWriter<'_> {
    fn sep(&mut self) {
        self.out.push_str(", ");
    }

    fn ref_text(&self, index: Option<EntityIndex>) -> String {
        match index {
            Some(i) => format!("#{}", self.graph.id_of(i)),
            None => "$".to_string(),
        }
    }

    /// `, #id` (or `, $` when unresolved).
    pub(crate) fn reference(&mut self, index: Option<EntityIndex>) {
        self.sep();
        let text = self.ref_text(index);
        self.out.push_str(&text);
    }

    /// `, (#a, #b, ...)`.
    pub(crate) fn reference_list<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = Option<EntityIndex>>,
    {
        self.sep();
        let refs: Vec<String> = items.into_iter().map(|i| self.ref_text(i)).collect();
        self.out.push('(');
        self.out.push_str(&refs.join(", "));
        self.out.push(')');
    }

    /// `, (x, y, z)`.
    pub(crate) fn triple(&mut self, x: f64, y: f64, z: f64) {
        self.sep();
        let _ = write!(
            self.out,
            "({}, {}, {})",
            format_real(x),
            format_real(y),
            format_real(z)
        );
    }

    /// `, 1.0`.
    pub(crate) fn real(&mut self, value: f64) {
        self.sep();
        self.out.push_str(&format_real(value));
    }

    /// `, .T.` / `, .F.`.
    pub(crate) fn logical(&mut self, value: bool) {
        self.sep();
        self.out.push_str(if value { ".T." } else { ".F." });
    }

    /// `, *`.
    pub(crate) fn derived(&mut self) {
        self.sep();
        self.out.push('*');
    }
}

/// Resolves `#id` arguments against a graph whose entities are all registered.
pub(crate) struct Resolver<'a> {
    graph: &'a EntityGraph,
    /// Entity being parsed, for diagnostics.
    owner: u64,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(graph: &'a EntityGraph, owner: u64) -> Self {
        Self { graph, owner }
    }

    /// Resolve a reference value to an entity of one of `expected` kinds.
    ///
    /// Missing ids and entities of another kind resolve to `None`.
    pub(crate) fn reference(
        &self,
        value: Option<&StepValue>,
        expected: &[EntityKind],
    ) -> Option<EntityIndex> {
        let id = value?.as_entity_ref()?;
        let Some(index) = self.graph.index_of(id) else {
            warn!(owner = self.owner, target = id, "unresolved entity reference");
            return None;
        };
        let kind = self.graph.get(index).kind();
        if expected.contains(&kind) {
            Some(index)
        } else {
            warn!(
                owner = self.owner,
                target = id,
                ?kind,
                ?expected,
                "entity reference has unexpected type"
            );
            None
        }
    }

    /// Kind of an already resolved entity.
    pub(crate) fn kind(&self, index: EntityIndex) -> EntityKind {
        self.graph.get(index).kind()
    }

    /// Resolve every entry of a list argument, dropping unresolved ones.
    pub(crate) fn reference_list(
        &self,
        value: Option<&StepValue>,
        expected: &[EntityKind],
    ) -> Vec<EntityIndex> {
        value
            .and_then(StepValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| self.reference(Some(v), expected))
            .collect()
    }
}

/// Read `(x, y, z)` from a list argument; missing components read as zero.
pub(crate) fn parse_triple(value: Option<&StepValue>) -> [f64; 3] {
    let mut out = [0.0; 3];
    if let Some(list) = value.and_then(StepValue::as_list) {
        for (slot, v) in out.iter_mut().zip(list) {
            *slot = v.as_real().unwrap_or(0.0);
        }
    }
    out
}

/// Read a logical argument, defaulting to `.T.`.
pub(crate) fn parse_logical(value: Option<&StepValue>) -> bool {
    value.and_then(StepValue::as_bool).unwrap_or(true)
}
