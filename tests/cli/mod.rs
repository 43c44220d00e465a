//! End-to-end tests of the pgpatch binary through assert_cmd. None of them
//! need a database server.

pub mod commands;
