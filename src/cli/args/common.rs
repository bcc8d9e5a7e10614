//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format - one row per entity (global default)
    #[default]
    Table,
    /// JSON format - mapped entities wrapped with metadata, for scripts
    Json,
}
