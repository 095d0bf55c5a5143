//! Equation systems and their algebra
//!
//! This module contains:
//! - `body` - right-hand sides as assignment transformers and their
//!   composable layers
//! - `system` - general (possibly infinite) equation systems
//! - `finite` - systems with known unknowns and an influence relation
//! - `graph` - systems generated from an edge structure, with localized
//!   combo application
//! - `relation` - multi-valued influence relations
//! - `tracer` - observers of body evaluation

pub mod body;
pub mod finite;
pub mod graph;
pub mod relation;
pub mod system;
pub mod tracer;

// Public re-exports (for external API)
pub use body::{BaseAssignment, Body, BodyWithDeps, CombineOp};
pub use finite::FiniteEquationSystem;
pub use graph::{GraphBody, GraphEquationSystem};
pub use relation::Relation;
pub use system::EquationSystem;
pub use tracer::{
    DebugEquationSystemTracer, EquationSystemTracer, NoopEquationSystemTracer,
    PerformanceEquationSystemTracer,
};
