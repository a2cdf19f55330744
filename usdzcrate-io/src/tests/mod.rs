//! Test modules for usdzcrate-io
//!
//! Cross-module tests: loading real files from disk through `load_mesh` and
//! carrying the result through serialization and packaging.
