//! CLI command modules.

pub mod embed;
pub mod extract;
pub mod flows;
