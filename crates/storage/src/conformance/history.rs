use super::{week_one, week_two, TestResult};
use crate::{History, SnapshotStore};

pub(super) fn run_history_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "history",
            "empty_store_has_no_history",
            empty_store_has_no_history(factory),
        ),
        TestResult::from_result(
            "history",
            "empty_store_loads_nothing",
            empty_store_loads_nothing(factory),
        ),
        TestResult::from_result(
            "history",
            "initial_persist_creates_history_without_rotation",
            initial_persist_creates_history_without_rotation(factory),
        ),
        TestResult::from_result(
            "history",
            "current_generation_marks_rotation_pending",
            current_generation_marks_rotation_pending(factory),
        ),
        TestResult::from_result(
            "history",
            "initial_persist_discards_stale_current",
            initial_persist_discards_stale_current(factory),
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A fresh store reports `NoHistory`.
fn empty_store_has_no_history<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let s = factory();
    let history = s.history().map_err(|e| e.to_string())?;
    if history != History::NoHistory {
        return Err(format!("expected NoHistory, got {:?}", history));
    }
    Ok(())
}

/// A fresh store has neither generation.
fn empty_store_loads_nothing<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let s = factory();
    if s.load_previous().map_err(|e| e.to_string())?.is_some() {
        return Err("expected no previous generation".to_string());
    }
    if s.load_current().map_err(|e| e.to_string())?.is_some() {
        return Err("expected no current generation".to_string());
    }
    Ok(())
}

/// After `persist_initial` the store has history and nothing to rotate.
fn initial_persist_creates_history_without_rotation<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    let history = s.history().map_err(|e| e.to_string())?;
    if history != (History::HasHistory { pending_rotation: false }) {
        return Err(format!(
            "expected HasHistory without pending rotation, got {:?}",
            history
        ));
    }
    if s.load_current().map_err(|e| e.to_string())?.is_some() {
        return Err("initial persist must not create a current generation".to_string());
    }
    Ok(())
}

/// Once a current generation exists, the next run must rotate.
fn current_generation_marks_rotation_pending<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    s.persist_current(&week_two()).map_err(|e| e.to_string())?;
    let history = s.history().map_err(|e| e.to_string())?;
    if history != (History::HasHistory { pending_rotation: true }) {
        return Err(format!(
            "expected HasHistory with pending rotation, got {:?}",
            history
        ));
    }
    Ok(())
}

/// `persist_initial` leaves exactly one generation, even over a leftover current.
fn initial_persist_discards_stale_current<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_current(&week_two()).map_err(|e| e.to_string())?;
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    if s.load_current().map_err(|e| e.to_string())?.is_some() {
        return Err("stale current generation survived persist_initial".to_string());
    }
    let history = s.history().map_err(|e| e.to_string())?;
    if history != (History::HasHistory { pending_rotation: false }) {
        return Err(format!(
            "expected HasHistory without pending rotation, got {:?}",
            history
        ));
    }
    Ok(())
}
