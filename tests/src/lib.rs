//! # playernet Test Suite
//!
//! Unified test crate for cross-process choreography that no single crate
//! can exercise alone: several directory processes sharing one bus, the
//! full connect request/response round trip, and network-wide login/logout
//! fan-out.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── connect_flow.rs   # request/response correlation end to end
//!     └── notifications.rs  # login/logout fan-out across processes
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p playernet-tests
//! cargo test -p playernet-tests integration::connect_flow
//! ```

#![allow(dead_code)]

pub mod integration;
