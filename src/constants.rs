// Configuration file name
pub const CONFIG_FILENAME: &str = "pgpatch.yaml";

// Suffix inserted before the extension of a rollback script
pub const DROP_FILE_SUFFIX: &str = "drop";
