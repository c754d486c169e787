//! Per-format parsers (`from_*`) and generators (`to_*`).

pub mod agent_skills;
pub mod claude;
pub mod copilot;
pub mod cursor;
pub mod kiro;
