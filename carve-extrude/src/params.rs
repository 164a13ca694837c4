//! Extrusion guidance parameters.

use carve_types::{UnitQuaternion, Vector3};

/// The controller's guidance for one extrusion frame.
#[derive(Debug, Clone, Copy)]
pub struct ExtrusionParams {
    /// Translation of the extruded face from its original position.
    pub translation: Vector3<f64>,
    /// Rotation applied to the extruded face about its centroid.
    pub rotation: UnitQuaternion<f64>,
    /// Constrain the pull to the face normal: the translation is
    /// vector-projected onto the normal and the rotation is ignored.
    pub lock_to_normal: bool,
}

impl ExtrusionParams {
    /// Guidance with no displacement.
    #[must_use]
    pub fn new() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            lock_to_normal: false,
        }
    }

    /// Set the translation.
    #[must_use]
    pub fn with_translation(mut self, translation: Vector3<f64>) -> Self {
        self.translation = translation;
        self
    }

    /// Set the rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the normal lock.
    #[must_use]
    pub const fn with_lock_to_normal(mut self, lock: bool) -> Self {
        self.lock_to_normal = lock;
        self
    }

    /// The translation the extrusion actually uses, given the face's
    /// outward normal.
    #[must_use]
    pub fn effective_translation(&self, normal: &Vector3<f64>) -> Vector3<f64> {
        if self.lock_to_normal {
            normal * self.translation.dot(normal)
        } else {
            self.translation
        }
    }

    /// The rotation the extrusion actually uses.
    #[must_use]
    pub fn effective_rotation(&self) -> UnitQuaternion<f64> {
        if self.lock_to_normal {
            UnitQuaternion::identity()
        } else {
            self.rotation
        }
    }
}

impl Default for ExtrusionParams {
    fn default() -> Self {
        Self::new()
    }
}

/// The extruded face's scale toward its translated centroid.
///
/// `1.0` is a full-size copy of the grabbed face, `0.0` collapses it to
/// a point (a cone). Shrinking ramps multiplicatively above `0.5` and
/// linearly below so the last stretch to zero doesn't crawl; enlarging
/// from zero restores the size the user last had.
#[derive(Debug, Clone, Copy)]
pub struct ExtrusionSize {
    value: f64,
    last_nonzero: f64,
    shrunk: bool,
}

impl ExtrusionSize {
    /// Start at full size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: 1.0,
            last_nonzero: 1.0,
            shrunk: false,
        }
    }

    /// The current scale in `[0, 1]`.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Whether the size was ever decreased this gesture.
    ///
    /// Side merging only activates after a shrink; a full-size extrusion
    /// can never produce collapsing sides.
    #[inline]
    #[must_use]
    pub const fn was_shrunk(&self) -> bool {
        self.shrunk
    }

    /// One shrink step: multiply by 0.9 above 0.5, subtract 0.08 below,
    /// floor at zero.
    pub fn shrink(&mut self) {
        self.shrunk = true;
        if self.value > 0.0 {
            self.last_nonzero = self.value;
        }
        self.value = if self.value > 0.5 {
            self.value * 0.9
        } else {
            (self.value - 0.08).max(0.0)
        };
    }

    /// One enlarge step: multiply by 1.1 capped at full size, or restore
    /// the last nonzero size when currently zero.
    pub fn enlarge(&mut self) {
        self.value = if self.value == 0.0 {
            self.last_nonzero
        } else {
            (self.value * 1.1).min(1.0)
        };
    }
}

impl Default for ExtrusionSize {
    fn default() -> Self {
        Self::new()
    }
}
