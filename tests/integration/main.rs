//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the orchestrator and
//! controllers over the public API against a scripted hardware bridge.
//! All tests run on the host with no real GPIO required.

mod control_loop_tests;
mod mock_bridge;
mod startup_tests;
