//! Workspace-root crate: hosts cross-crate integration tests under `tests/`.
