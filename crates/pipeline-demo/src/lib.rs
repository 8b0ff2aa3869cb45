//! Top-level facade crate for pipeline-demo.
//!
//! Re-exports the core metrics types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use pipeline_demo_core::*;
}

pub mod gateway {
    pub use pipeline_demo_gateway::*;
}
