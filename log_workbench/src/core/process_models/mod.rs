//! Process Models
pub mod case_centric;
