use super::{ids, make_snapshot, week_one, TestResult};
use crate::{Cell, SnapshotStore};

pub(super) fn run_roundtrip_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "roundtrip",
            "persisted_snapshot_loads_unchanged",
            persisted_snapshot_loads_unchanged(factory),
        ),
        TestResult::from_result(
            "roundtrip",
            "missing_numeric_stays_missing",
            missing_numeric_stays_missing(factory),
        ),
        TestResult::from_result(
            "roundtrip",
            "row_order_is_preserved",
            row_order_is_preserved(factory),
        ),
        TestResult::from_result(
            "roundtrip",
            "empty_snapshot_round_trips",
            empty_snapshot_round_trips(factory),
        ),
    ]
}

// ── Test implementations ──────────────────────────────────────────────────────

/// persist_current then load_current yields an equal snapshot.
fn persisted_snapshot_loads_unchanged<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_current(&week_one()).map_err(|e| e.to_string())?;
    let loaded = s
        .load_current()
        .map_err(|e| e.to_string())?
        .ok_or("current generation missing after persist")?;
    if loaded != week_one() {
        return Err(format!("round trip changed snapshot: {:?}", loaded));
    }
    Ok(())
}

/// A missing numeric value must not come back as zero.
fn missing_numeric_stays_missing<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    s.persist_initial(&week_one()).map_err(|e| e.to_string())?;
    let loaded = s
        .load_previous()
        .map_err(|e| e.to_string())?
        .ok_or("previous generation missing after persist")?;
    match loaded.cell("NCT002", "Enrollment") {
        Some(Cell::Numeric(None)) => Ok(()),
        other => Err(format!("expected missing enrollment, got {:?}", other)),
    }
}

/// Rows load back in the order they were persisted.
fn row_order_is_preserved<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let snapshot = make_snapshot(&[
        ("NCT900", "z", "Recruiting", Some(1.0)),
        ("NCT100", "a", "Recruiting", Some(2.0)),
        ("NCT500", "m", "Recruiting", Some(3.0)),
    ]);
    s.persist_current(&snapshot).map_err(|e| e.to_string())?;
    let loaded = s
        .load_current()
        .map_err(|e| e.to_string())?
        .ok_or("current generation missing after persist")?;
    if ids(&loaded) != ids(&snapshot) {
        return Err(format!(
            "expected order {:?}, got {:?}",
            ids(&snapshot),
            ids(&loaded)
        ));
    }
    Ok(())
}

/// A snapshot with zero rows still persists and loads as a generation.
fn empty_snapshot_round_trips<S, F>(factory: &F) -> Result<(), String>
where
    S: SnapshotStore,
    F: Fn() -> S,
{
    let mut s = factory();
    let empty = make_snapshot(&[]);
    s.persist_current(&empty).map_err(|e| e.to_string())?;
    let loaded = s
        .load_current()
        .map_err(|e| e.to_string())?
        .ok_or("empty generation was not persisted")?;
    if loaded != empty {
        return Err(format!("expected empty snapshot, got {:?}", loaded));
    }
    Ok(())
}
