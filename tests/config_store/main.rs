//! Config store integration tests.

mod cleanup;
mod filesystem;
mod versioning;
