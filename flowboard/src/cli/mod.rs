//! Line-oriented store scripts for the `flowboard run` command

mod script;

pub use script::{ScriptCommand, ScriptReport, ScriptSession};
