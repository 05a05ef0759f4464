//! Workspace-level integration tests for parbench live under `tests/`.
