// Integration tests for pgpatch

pub mod cli;
pub mod integration;
pub mod unit;
