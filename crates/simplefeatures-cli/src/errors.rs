use console::style;
use simplefeatures_core::SfError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a cast the hierarchy does not allow
pub fn unsupported_cast(from: &str, to: &str, hierarchy: &str) -> CliError {
    CliError::new("Unsupported cast")
        .with_context(format!(
            "Cannot cast {} to {}.\n\nGeometries can only be decomposed along: {}",
            from, to, hierarchy
        ))
        .with_suggestion("Pick a target kind to the right of the source kind")
        .with_suggestion("Check the declared kind: sf info <table>")
        .with_help("Run: sf cast --help")
}

/// Create error for a geometry column name that does not match the table
pub fn geometry_column_not_found(column: &str, available: &str) -> CliError {
    CliError::new("Geometry column not found")
        .with_context(format!(
            "The table has no geometry column named '{}'.\n\nGeometry column: {}",
            column, available
        ))
        .with_suggestion(format!("Pass --geometry-column {}", available))
        .with_suggestion("Or set geometry_column in sf.toml or SF_GEOMETRY_COLUMN")
        .with_help("Run: sf config")
}

/// Create error for a table without a declared geometry kind
pub fn missing_metadata(key: &str) -> CliError {
    CliError::new("Missing table metadata")
        .with_context(format!("The table does not declare '{}'.", key))
        .with_suggestion("Declare it: sf set-crs <table> --epsg <code> --geometry-kind <kind>")
        .with_help("Run: sf set-crs --help")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check sf.toml (or the file passed with --config) for syntax errors")
        .with_help("Run: sf config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(sf_error) = error.downcast_ref::<SfError>() {
        match sf_error {
            SfError::UnsupportedCast { from, to, hierarchy } => {
                return unsupported_cast(from, to, hierarchy)
            }
            SfError::GeometryColumnNotFound { column, available } => {
                return geometry_column_not_found(column, available)
            }
            SfError::MissingMetadata { key } => return missing_metadata(key),
            SfError::ConfigInvalid { key, reason } => return invalid_config(key, reason),
            _ => {}
        }
    }

    let message = format!("{:#}", error);

    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
    } else {
        CliError::new(message)
    }
}
