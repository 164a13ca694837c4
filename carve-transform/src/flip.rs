//! Axis mirroring of mesh batches.

use nalgebra::Quaternion;
use tracing::debug;

use carve_types::{Mesh, Point3, UnitQuaternion, Vector3};

/// A principal world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// The principal axis closest to a direction vector.
    ///
    /// Ties resolve in X, Y, Z order.
    #[must_use]
    pub fn from_forward(forward: &Vector3<f64>) -> Self {
        let (ax, ay, az) = (forward.x.abs(), forward.y.abs(), forward.z.abs());
        if ax >= ay && ax >= az {
            Self::X
        } else if ay >= az {
            Self::Y
        } else {
            Self::Z
        }
    }

    /// Reflect a point's coordinate on this axis about `center`.
    fn reflect_point(self, p: Point3<f64>, center: f64) -> Point3<f64> {
        let mut out = p;
        match self {
            Self::X => out.x = 2.0f64.mul_add(center, -p.x),
            Self::Y => out.y = 2.0f64.mul_add(center, -p.y),
            Self::Z => out.z = 2.0f64.mul_add(center, -p.z),
        }
        out
    }

    /// Reflect a vector's coordinate on this axis (about the origin).
    fn reflect_vector(self, v: Vector3<f64>) -> Vector3<f64> {
        let mut out = v;
        match self {
            Self::X => out.x = -v.x,
            Self::Y => out.y = -v.y,
            Self::Z => out.z = -v.z,
        }
        out
    }

    /// Conjugate a rotation by the mirror across this axis's plane.
    ///
    /// The vector component along the mirror normal is kept; the other
    /// two are negated.
    fn reflect_rotation(self, rotation: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        let q = rotation.quaternion();
        let (w, i, j, k) = (q.w, q.i, q.j, q.k);
        let mirrored = match self {
            Self::X => Quaternion::new(w, i, -j, -k),
            Self::Y => Quaternion::new(w, -i, j, -k),
            Self::Z => Quaternion::new(w, -i, -j, k),
        };
        UnitQuaternion::from_quaternion(mirrored)
    }
}

/// Mirror a batch of meshes about one principal axis.
///
/// The mirror plane passes through the batch's shared centroid,
/// perpendicular to whichever axis lies closest to `forward`. Every
/// vertex coordinate on that axis is reflected and every face's winding
/// order is reversed, keeping outward normals consistent after the
/// mirror. Returns new copies; the inputs and any external store are
/// untouched.
///
/// Mirroring twice about the same axis is the identity, windings
/// included.
#[must_use]
pub fn flip_meshes(meshes: &[Mesh], forward: &Vector3<f64>) -> Vec<Mesh> {
    let axis = Axis::from_forward(forward);
    let centroid = shared_centroid(meshes);
    let center = match axis {
        Axis::X => centroid.x,
        Axis::Y => centroid.y,
        Axis::Z => centroid.z,
    };
    debug!(count = meshes.len(), ?axis, "mirroring mesh batch");

    let mut flipped = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        let mut copy = mesh.clone();
        copy.offset = axis
            .reflect_point(Point3::from(mesh.offset), center)
            .coords;
        copy.rotation = axis.reflect_rotation(&mesh.rotation);

        let vertex_updates: Vec<_> = copy
            .vertices()
            .map(|v| {
                (
                    v.id,
                    Point3::from(axis.reflect_vector(v.position.coords)),
                )
            })
            .collect();
        let face_updates: Vec<_> = copy
            .faces()
            .map(|f| {
                let mut winding = f.vertex_ids.to_vec();
                winding.reverse();
                (f.id, winding, f.properties)
            })
            .collect();

        let mut op = copy.start_operation();
        // Ids come straight from the live tables
        let _ = op.modify_vertices(vertex_updates);
        for (id, winding, properties) in face_updates {
            let _ = op.modify_face(id, &winding, properties);
        }
        op.commit();
        flipped.push(copy);
    }
    flipped
}

/// Average of the batch's placement offsets.
fn shared_centroid(meshes: &[Mesh]) -> Vector3<f64> {
    if meshes.is_empty() {
        return Vector3::zeros();
    }
    meshes
        .iter()
        .fold(Vector3::zeros(), |acc, m| acc + m.offset)
        / meshes.len() as f64
}
