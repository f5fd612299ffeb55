//! End-to-end tests for Async Race.
//!
//! The suites live under `tests/`; they stand up a wiremock backend speaking
//! the documented REST contract and drive the real clients, coordinator,
//! registry, and ledger against it.
