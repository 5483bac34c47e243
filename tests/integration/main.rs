//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises the orchestrator
//! against the simulated collaborators.  All tests run on the host with
//! no real hardware required.

mod harness;
mod orchestrator_tests;
mod request_tests;
mod session_tests;
