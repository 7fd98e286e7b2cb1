//! Crate-wide constants.

/// Environment variable overriding the pipeline working directory.
pub const WORK_DIR_ENV: &str = "CIPHERBUILD_WORK_DIR";

/// Compile guard present in the amalgamation when the encryption codec is
/// enabled. Its absence from `sqlite3.c` means the codec flag was dropped
/// and the engine was built without encryption support.
pub const CODEC_GUARD: &str = "SQLITE_HAS_CODEC";

/// File name of the amalgamated engine source.
pub const AMALGAMATION_SOURCE: &str = "sqlite3.c";

/// File name of the amalgamated engine header.
pub const AMALGAMATION_HEADER: &str = "sqlite3.h";

/// Name prefix of the binding's platform/version-tagged build output
/// directories (e.g. `lib.linux-x86_64-cpython-311`).
pub const BUILD_DIR_PREFIX: &str = "lib.";

/// SOURCE_DATE_EPOCH passed to every tool invocation for reproducible
/// timestamps. Value is 315532800 = January 1, 1980 00:00:00 UTC (ZIP epoch).
pub const BUILD_EPOCH: &str = "315532800";
