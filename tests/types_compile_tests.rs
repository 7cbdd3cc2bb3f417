// ABOUTME: Trybuild runner for compile-time type safety tests.
// ABOUTME: Verifies that out-of-order deployment transitions fail to compile.

#[test]
fn promote_not_available_on_initialized() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/invalid_transition_promote_on_initialized.rs");
}

#[test]
fn rollback_not_available_on_completed() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/compile_fail/invalid_transition_rollback_on_completed.rs");
}
