pub mod orchestrator;
pub mod policy;
pub mod script;
