//! Crate-wide constants.

pub const APP_NAME: &str = "buildpipe";

/// Config file looked up in the project root when none is named explicitly.
pub const CONFIG_FILENAME: &str = "buildpipe.toml";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "BUILDPIPE_CONFIG";

/// Archive member that holds the embedded manifest.
pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// January 1, 1980 00:00:00 UTC, the earliest timestamp a ZIP entry can carry.
pub const SOURCE_DATE_EPOCH: &str = "315532800";

/// Unix permissions recorded on every archive member.
pub const ARCHIVE_ENTRY_MODE: u32 = 0o644;

/// Default compiler invocation; `$src` and `$out` are set by the runner.
pub const DEFAULT_COMPILE_COMMAND: &str = r#"javac -d "$out" $(find "$src" -name '*.java')"#;
