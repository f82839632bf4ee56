//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one part of the
//! lifecycle against the recording mocks in `mock_platform`.  All tests run
//! on the host with no hardware or network.

mod cycle_tests;
mod mock_platform;
mod startup_tests;
mod update_tests;
