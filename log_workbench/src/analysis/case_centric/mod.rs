//! Case-centric Process Analysis
pub mod log_summary;
