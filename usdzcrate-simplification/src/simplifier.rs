//! Face budget reduction with a guaranteed fallback

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use tracing::{info, warn};
use usdzcrate_core::TriangleMesh;

use crate::{sample_faces, Decimation, EdgeCollapseSimplifier, MeshDecimator};

/// How a [`Simplifier`] arrived at its output.
#[derive(Debug, Clone, PartialEq)]
pub enum SimplifyOutcome {
    /// Simplification disabled or the mesh was already within budget
    Unchanged,
    /// The primary decimator produced the mesh
    Decimated,
    /// The primary decimator failed and stride sampling was used instead
    Sampled { reason: String },
}

/// A simplified mesh together with the path that produced it.
#[derive(Debug, Clone)]
pub struct Simplified {
    pub mesh: TriangleMesh,
    pub outcome: SimplifyOutcome,
}

/// Reduces meshes toward a face budget.
///
/// The primary decimator is tried first. Any failure it reports, including a
/// panic or a result with dangling indices, switches to [`sample_faces`],
/// which always succeeds.
#[derive(Debug, Clone)]
pub struct Simplifier<D = EdgeCollapseSimplifier> {
    decimator: D,
}

impl Default for Simplifier<EdgeCollapseSimplifier> {
    fn default() -> Self {
        // Boundaries are penalised rather than frozen so open meshes can still
        // reach the budget.
        Self::new(EdgeCollapseSimplifier::with_params(None, false, 100.0))
    }
}

impl<D: MeshDecimator> Simplifier<D> {
    pub fn new(decimator: D) -> Self {
        Self { decimator }
    }

    pub fn decimator(&self) -> &D {
        &self.decimator
    }

    /// Reduce `mesh` to about `target_faces` faces. A target of zero disables
    /// simplification, as does a mesh already within budget.
    pub fn simplify(&self, mesh: TriangleMesh, target_faces: usize) -> Simplified {
        if target_faces == 0 || mesh.face_count() <= target_faces {
            return Simplified {
                mesh,
                outcome: SimplifyOutcome::Unchanged,
            };
        }

        let original_faces = mesh.face_count();
        match self.try_decimate(&mesh, target_faces) {
            Decimation::Reduced(reduced) => {
                info!(
                    "Simplified with {}: {} -> {} faces (target {})",
                    self.decimator.name(),
                    original_faces,
                    reduced.face_count(),
                    target_faces
                );
                Simplified {
                    mesh: reduced,
                    outcome: SimplifyOutcome::Decimated,
                }
            }
            Decimation::ReductionUnavailable(reason) => {
                warn!(
                    "Simplification failed ({}), using sampled subset of faces",
                    reason
                );
                let sampled = sample_faces(&mesh, target_faces);
                info!(
                    "Sampled {} -> {} faces (target {})",
                    original_faces,
                    sampled.face_count(),
                    target_faces
                );
                Simplified {
                    mesh: sampled,
                    outcome: SimplifyOutcome::Sampled { reason },
                }
            }
        }
    }

    fn try_decimate(&self, mesh: &TriangleMesh, target_faces: usize) -> Decimation {
        let attempt = catch_quietly(|| self.decimator.decimate(mesh, target_faces));
        match attempt {
            Ok(Decimation::Reduced(reduced)) if reduced.is_empty() => {
                Decimation::ReductionUnavailable(format!(
                    "{} produced an empty mesh",
                    self.decimator.name()
                ))
            }
            Ok(Decimation::Reduced(reduced)) if reduced.face_count() >= mesh.face_count() => {
                Decimation::ReductionUnavailable(format!(
                    "{} removed no faces ({} remain)",
                    self.decimator.name(),
                    reduced.face_count()
                ))
            }
            Ok(Decimation::Reduced(reduced)) => match reduced.validate_indices() {
                Ok(()) => Decimation::Reduced(reduced),
                Err(e) => Decimation::ReductionUnavailable(e.to_string()),
            },
            Ok(unavailable) => unavailable,
            Err(payload) => Decimation::ReductionUnavailable(panic_message(payload.as_ref())),
        }
    }
}

thread_local! {
    static SILENCE_PANICS: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Run `f` under `catch_unwind` without the panic hook printing to stderr.
///
/// The hook installed here only mutes panics raised on the current thread
/// while `f` runs; every other panic reaches the previous hook unchanged.
fn catch_quietly<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !SILENCE_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });

    let outer = SILENCE_PANICS.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    SILENCE_PANICS.with(|flag| flag.set(outer));
    result
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("decimator panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("decimator panicked: {s}")
    } else {
        "decimator panicked".to_string()
    }
}
