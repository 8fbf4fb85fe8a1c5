//! Integration test crate for firesweep. All tests live under `tests/`.
