//! End-to-end identity brokering tests.
//!
//! The tests live under `tests/`; this library target is intentionally empty.
