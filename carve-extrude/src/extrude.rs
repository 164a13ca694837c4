//! The extrusion state machine and commit.

use tracing::debug;

use carve_types::{FaceId, FaceProperties, Mesh, Point3, VertexId};

use crate::error::{ExtrudeError, ExtrudeResult};
use crate::params::{ExtrusionParams, ExtrusionSize};
use crate::sides::{build_extrusion_sides, ExtrusionSide};

/// Two extrusion positions this close reuse one vertex.
const VERTEX_REUSE_DISTANCE: f64 = 1e-9;

/// Replace a face with its extrusion in one transaction.
///
/// Deletes the grabbed face, adds one side face per original edge (quad,
/// or triangle where the side collapsed), and caps the far end with a
/// face over the distinct extrusion vertices. Extrusion positions that
/// coincide reuse a single vertex instead of duplicating it. All new
/// faces inherit the grabbed face's properties.
///
/// Returns the ids of the vertices the extrusion added.
///
/// # Errors
///
/// Fails without mutating when the face is missing or degenerate, or
/// when a side face cannot be built.
pub fn extrude_face(
    mesh: &mut Mesh,
    face_id: FaceId,
    params: &ExtrusionParams,
    size: &ExtrusionSize,
) -> ExtrudeResult<Vec<VertexId>> {
    let (sides, merged) = build_extrusion_sides(mesh, face_id, params, size)?;
    let properties = mesh
        .face(face_id)
        .map(|f| f.properties)
        .ok_or(ExtrudeError::UnknownFace(face_id))?;

    debug!(%face_id, sides = sides.len(), merged, "committing extrusion");

    let mut op = mesh.start_operation();
    op.delete_face(face_id)?;

    // Position-keyed vertex reuse across sides and cap
    let mut created: Vec<(Point3<f64>, VertexId)> = Vec::new();
    let mut vertex_for = |op: &mut carve_types::GeometryOperation<'_>, pos: Point3<f64>| {
        if let Some((_, id)) = created
            .iter()
            .find(|(p, _)| (p - pos).norm() < VERTEX_REUSE_DISTANCE)
        {
            return *id;
        }
        let vertex = op.add_vertex_in_mesh_space(pos);
        created.push((pos, vertex.id));
        vertex.id
    };

    let mut ring: Vec<VertexId> = Vec::with_capacity(sides.len());
    for side in &sides {
        let left = vertex_for(&mut op, side.extrusion_left);
        ring.push(left);
        if side.is_triangle {
            op.add_face(&[side.base_left, side.base_right, left], properties)?;
        } else {
            let right = vertex_for(&mut op, side.extrusion_right);
            op.add_face(&[side.base_left, side.base_right, right, left], properties)?;
        }
    }

    // Cap over the distinct extrusion vertices, keeping the original
    // winding direction. A fully collapsed cone has no cap.
    let mut cap: Vec<VertexId> = Vec::with_capacity(ring.len());
    for id in ring {
        if !cap.contains(&id) {
            cap.push(id);
        }
    }
    if cap.len() >= 3 {
        op.add_face(&cap, properties)?;
    }

    op.commit();

    let mut added: Vec<VertexId> = created.into_iter().map(|(_, id)| id).collect();
    added.sort_unstable();
    Ok(added)
}

/// Phase of a grab-and-pull extrusion gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtruderState {
    /// Constructed, waiting for the grab.
    Idle,
    /// Following the controller, showing guide geometry.
    Guiding,
    /// Release received, extrusion being written.
    Committing,
}

impl ExtruderState {
    const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Guiding => "guiding",
            Self::Committing => "committing",
        }
    }
}

/// Per-grabbed-face extrusion state machine.
///
/// Driven by discrete inputs: grab, guide updates, shrink/enlarge steps,
/// and release. One extruder exists per grabbed face; it captures the
/// face's properties at construction and never touches the mesh until
/// [`commit`](Self::commit).
#[derive(Debug)]
pub struct FaceExtruder {
    face_id: FaceId,
    properties: FaceProperties,
    params: ExtrusionParams,
    size: ExtrusionSize,
    state: ExtruderState,
}

impl FaceExtruder {
    /// Create an extruder for a face, capturing its properties.
    ///
    /// # Errors
    ///
    /// Fails when the face is missing or has no usable normal.
    pub fn new(mesh: &Mesh, face_id: FaceId) -> ExtrudeResult<Self> {
        // Reject faces an extrusion could never use
        build_extrusion_sides(
            mesh,
            face_id,
            &ExtrusionParams::new(),
            &ExtrusionSize::new(),
        )?;
        let properties = mesh
            .face(face_id)
            .map(|f| f.properties)
            .ok_or(ExtrudeError::UnknownFace(face_id))?;
        Ok(Self {
            face_id,
            properties,
            params: ExtrusionParams::new(),
            size: ExtrusionSize::new(),
            state: ExtruderState::Idle,
        })
    }

    /// The grabbed face.
    #[must_use]
    pub const fn face_id(&self) -> FaceId {
        self.face_id
    }

    /// Properties captured at grab time.
    #[must_use]
    pub const fn properties(&self) -> FaceProperties {
        self.properties
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> ExtruderState {
        self.state
    }

    /// Current extrusion scale.
    #[must_use]
    pub const fn size(&self) -> f64 {
        self.size.value()
    }

    /// Begin guiding.
    ///
    /// # Errors
    ///
    /// Fails unless idle.
    pub fn grab(&mut self) -> ExtrudeResult<()> {
        self.expect_state(ExtruderState::Idle, "grab")?;
        self.state = ExtruderState::Guiding;
        Ok(())
    }

    /// Update the controller guidance.
    ///
    /// # Errors
    ///
    /// Fails unless guiding.
    pub fn guide(&mut self, params: ExtrusionParams) -> ExtrudeResult<()> {
        self.expect_state(ExtruderState::Guiding, "guide")?;
        self.params = params;
        Ok(())
    }

    /// One shrink step of the extruded face.
    ///
    /// # Errors
    ///
    /// Fails unless guiding.
    pub fn shrink(&mut self) -> ExtrudeResult<()> {
        self.expect_state(ExtruderState::Guiding, "shrink")?;
        self.size.shrink();
        Ok(())
    }

    /// One enlarge step of the extruded face.
    ///
    /// # Errors
    ///
    /// Fails unless guiding.
    pub fn enlarge(&mut self) -> ExtrudeResult<()> {
        self.expect_state(ExtruderState::Guiding, "enlarge")?;
        self.size.enlarge();
        Ok(())
    }

    /// The guide geometry for the current frame.
    ///
    /// # Errors
    ///
    /// Fails unless guiding, or when the face has vanished from the mesh.
    pub fn preview(&self, mesh: &Mesh) -> ExtrudeResult<(Vec<ExtrusionSide>, bool)> {
        self.expect_state(ExtruderState::Guiding, "preview")?;
        build_extrusion_sides(mesh, self.face_id, &self.params, &self.size)
    }

    /// Release: write the extrusion into the mesh and return to idle.
    ///
    /// # Errors
    ///
    /// Fails unless guiding; on a geometry error the mesh is untouched
    /// and the extruder returns to idle.
    pub fn commit(&mut self, mesh: &mut Mesh) -> ExtrudeResult<Vec<VertexId>> {
        self.expect_state(ExtruderState::Guiding, "commit")?;
        self.state = ExtruderState::Committing;
        let result = extrude_face(mesh, self.face_id, &self.params, &self.size);
        self.state = ExtruderState::Idle;
        result
    }

    /// Abandon the gesture without touching the mesh.
    pub fn cancel(&mut self) {
        self.state = ExtruderState::Idle;
        self.params = ExtrusionParams::new();
        self.size = ExtrusionSize::new();
    }

    fn expect_state(&self, expected: ExtruderState, action: &'static str) -> ExtrudeResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ExtrudeError::InvalidState {
                action,
                state: self.state.name(),
            })
        }
    }
}
