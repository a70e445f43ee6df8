//! Process Analysis
//!
//! This module contains read-only techniques summarizing event data (counters, variants, durations).

pub mod case_centric;
