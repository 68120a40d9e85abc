//! # Stitch Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Services shared by tests and benches
//! └── integration/      # Behaviour across registry, container, bus and stores
//!     ├── cycles.rs
//!     ├── lifecycle.rs
//!     ├── snapshot.rs
//!     └── runtime.rs
//!
//! tests/benches/
//! └── container_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p stitch-tests
//!
//! # By area
//! cargo test -p stitch-tests integration::cycles
//! cargo test -p stitch-tests integration::lifecycle
//!
//! # Benchmarks
//! cargo bench -p stitch-tests
//! ```

#![allow(dead_code)]

pub mod integration;
