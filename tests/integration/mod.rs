pub mod command_helpers;
