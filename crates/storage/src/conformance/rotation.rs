use super::{ids, week_one, week_three, week_two, TestResult};
use crate::{History, SnapshotStore};

pub(super) fn run_rotation_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "rotation",
            "rotate_promotes_current_to_previous",
            rotate_promotes_current_to_previous(factory),
        ),
        TestResult::from_result(
            "rotation",
            "rotate_clears_pending_flag",
            rotate_clears_pending_flag(factory),
        ),
        TestResult::from_result(
            "rotation",
            "rotate_without_current_is_noop",
            rotate_without_current_is_noop(factory),
        ),
        TestResult::from_result(
            "rotation",
            "only_one_prior_generation_survives",
            only_one_prior_generation_survives(factory),
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

/// After rotate, the previous generation holds what was current.
fn rotate_promotes_current_to_previous<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    s.persist_current(&week_two()).map_err(|e| e.to_string())?;
    let rotated = s.rotate().map_err(|e| e.to_string())?;
    if !rotated {
        return Err("rotate reported nothing to promote".to_string());
    }
    let previous = s
        .load_previous()
        .map_err(|e| e.to_string())?
        .ok_or("previous generation missing after rotate")?;
    if ids(&previous) != ids(&week_two()) {
        return Err(format!(
            "expected previous ids {:?}, got {:?}",
            ids(&week_two()),
            ids(&previous)
        ));
    }
    Ok(())
}

/// After rotate there is no current generation left to promote.
fn rotate_clears_pending_flag<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    s.persist_current(&week_two()).map_err(|e| e.to_string())?;
    s.rotate().map_err(|e| e.to_string())?;
    let history = s.history().map_err(|e| e.to_string())?;
    if history != (History::HasHistory { pending_rotation: false }) {
        return Err(format!("expected no pending rotation, got {:?}", history));
    }
    if s.load_current().map_err(|e| e.to_string())?.is_some() {
        return Err("current generation still present after rotate".to_string());
    }
    Ok(())
}

/// With no current generation, rotate returns false and keeps previous intact.
fn rotate_without_current_is_noop<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    let rotated = s.rotate().map_err(|e| e.to_string())?;
    if rotated {
        return Err("rotate promoted a generation that does not exist".to_string());
    }
    let previous = s
        .load_previous()
        .map_err(|e| e.to_string())?
        .ok_or("previous generation lost by no-op rotate")?;
    if previous != week_one() {
        return Err("previous generation changed by no-op rotate".to_string());
    }
    Ok(())
}

/// Three runs in a row: the first generation is gone, the second is previous.
fn only_one_prior_generation_survives<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    s.persist_current(&week_two()).map_err(|e| e.to_string())?;
    s.rotate().map_err(|e| e.to_string())?;
    s.persist_current(&week_three()).map_err(|e| e.to_string())?;

    let previous = s
        .load_previous()
        .map_err(|e| e.to_string())?
        .ok_or("previous generation missing")?;
    let current = s
        .load_current()
        .map_err(|e| e.to_string())?
        .ok_or("current generation missing")?;
    if previous != week_two() {
        return Err(format!("expected week two as previous, got {:?}", ids(&previous)));
    }
    if current != week_three() {
        return Err(format!("expected week three as current, got {:?}", ids(&current)));
    }
    Ok(())
}
