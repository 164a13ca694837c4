//! The worker thread and its mailbox.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use hashbrown::HashMap;
use tracing::{debug, warn};

use carve_repair::{fix_mutated_mesh, is_valid_mesh, FixParams};
use carve_types::{Mesh, MeshId};

use crate::snapshot::SnapshotBatch;

/// Lifecycle of the validation worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No worker thread exists.
    NotRunning,
    /// The thread was spawned but has not reached its loop yet.
    Starting,
    /// The worker is parked on the condition variable.
    WaitingForData,
    /// The worker is fixing and validating a batch.
    Validating,
    /// Stop was requested; the worker is winding down.
    Quitting,
}

/// Result of the most recent background validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Nothing has been validated yet this gesture.
    Unknown,
    /// The latest validated batch was sound (after fixing).
    Valid,
    /// The latest validated batch could not be made sound.
    Invalid,
}

impl Validity {
    const fn to_word(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Valid => 1,
            Self::Invalid => 2,
        }
    }

    const fn from_word(word: u8) -> Self {
        match word {
            1 => Self::Valid,
            2 => Self::Invalid,
            _ => Self::Unknown,
        }
    }
}

/// The lock-guarded mailbox shared with the worker.
struct Slot {
    state: PipelineState,
    pending: Option<SnapshotBatch>,
}

struct Shared {
    slot: Mutex<Slot>,
    wakeup: Condvar,
    /// Single-writer (worker), many-reader word; no lock on the read path.
    validity: AtomicU8,
    /// Replaced wholesale after each valid batch, never mutated in place.
    last_good: Mutex<Arc<HashMap<MeshId, Mesh>>>,
}

/// Owner of the background validation worker.
///
/// Construction spawns the worker; [`stop`](Self::stop) (or drop) winds
/// it down and joins it.
pub struct BackgroundValidator {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundValidator {
    /// Spawn the worker.
    ///
    /// `originals` are the last-committed states of every mesh the
    /// gesture may touch; the fixer compares naive clones against them.
    #[must_use]
    pub fn start(originals: HashMap<MeshId, Mesh>, params: FixParams) -> Self {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                state: PipelineState::Starting,
                pending: None,
            }),
            wakeup: Condvar::new(),
            validity: AtomicU8::new(Validity::Unknown.to_word()),
            last_good: Mutex::new(Arc::new(HashMap::new())),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::spawn(move || {
            worker_loop(&worker_shared, &originals, &params);
        });

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Submit a batch, best-effort.
    ///
    /// Non-blocking: while the worker is busy validating, the batch is
    /// silently dropped and `false` comes back; the producer re-offers
    /// next frame. A batch still sitting unconsumed in the mailbox is
    /// replaced (latest wins).
    pub fn offer(&self, batch: SnapshotBatch) -> bool {
        let Ok(mut slot) = self.shared.slot.lock() else {
            return false;
        };
        if slot.state != PipelineState::WaitingForData {
            return false;
        }
        slot.pending = Some(batch);
        self.shared.wakeup.notify_one();
        true
    }

    /// The most recent validation verdict. Lock-free.
    #[must_use]
    pub fn validity(&self) -> Validity {
        Validity::from_word(self.shared.validity.load(Ordering::Acquire))
    }

    /// The last batch that validated, fixed, keyed by mesh id.
    ///
    /// The returned map is an immutable snapshot; the worker publishes a
    /// new one wholesale rather than mutating it.
    #[must_use]
    pub fn last_known_good(&self) -> Arc<HashMap<MeshId, Mesh>> {
        match self.shared.last_good.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(_) => Arc::new(HashMap::new()),
        }
    }

    /// The worker's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.shared
            .slot
            .lock()
            .map_or(PipelineState::NotRunning, |slot| slot.state)
    }

    /// Request shutdown and wait for the worker to exit.
    ///
    /// The last-good state freezes at whatever the worker computed most
    /// recently; the final frame's data is not retroactively validated.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        if let Ok(mut slot) = self.shared.slot.lock() {
            slot.state = PipelineState::Quitting;
            slot.pending = None;
            self.shared.wakeup.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("background validator worker panicked");
            }
        }
    }
}

impl Drop for BackgroundValidator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BackgroundValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundValidator")
            .field("state", &self.state())
            .field("validity", &self.validity())
            .finish()
    }
}

fn worker_loop(
    shared: &Shared,
    originals: &HashMap<MeshId, Mesh>,
    params: &FixParams,
) {
    let Ok(mut slot) = shared.slot.lock() else {
        return;
    };
    slot.state = PipelineState::WaitingForData;

    loop {
        // Re-check after every wake: spurious wakeups are expected
        while slot.state == PipelineState::WaitingForData && slot.pending.is_none() {
            slot = match shared.wakeup.wait(slot) {
                Ok(guard) => guard,
                Err(_) => return,
            };
        }
        if slot.state == PipelineState::Quitting {
            break;
        }
        let Some(batch) = slot.pending.take() else {
            continue;
        };
        slot.state = PipelineState::Validating;
        drop(slot);

        let verdict = validate_batch(originals, batch, params);
        match verdict {
            Some(good) => {
                if let Ok(mut last_good) = shared.last_good.lock() {
                    *last_good = Arc::new(good);
                }
                shared
                    .validity
                    .store(Validity::Valid.to_word(), Ordering::Release);
            }
            None => {
                shared
                    .validity
                    .store(Validity::Invalid.to_word(), Ordering::Release);
            }
        }

        slot = match shared.slot.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if slot.state == PipelineState::Quitting {
            break;
        }
        slot.state = PipelineState::WaitingForData;
    }

    slot.state = PipelineState::NotRunning;
}

/// Fix and validate one batch on the worker's own clones.
///
/// All meshes must end up valid for the batch to count; one bad mesh
/// poisons the whole frame, matching the gesture's all-or-nothing
/// commit.
fn validate_batch(
    originals: &HashMap<MeshId, Mesh>,
    batch: SnapshotBatch,
    params: &FixParams,
) -> Option<HashMap<MeshId, Mesh>> {
    let mut good: HashMap<MeshId, Mesh> = HashMap::with_capacity(batch.len());
    for snapshot in batch {
        let mut mesh = snapshot.mesh;
        let id = mesh.id();
        let Some(original) = originals.get(&id) else {
            debug!(mesh = %id, "snapshot for a mesh the validator was not started with");
            return None;
        };
        fix_mutated_mesh(original, &mut mesh, &snapshot.moved, params);
        if !is_valid_mesh(&mesh, Some(&snapshot.moved)) {
            return None;
        }
        good.insert(id, mesh);
    }
    Some(good)
}
