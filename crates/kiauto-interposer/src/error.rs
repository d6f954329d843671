use kiauto_config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum InterposerError {
    /// `dlsym` found nothing; the wrapped call is skipped
    #[error("dlsym failed : {symbol}: {reason}")]
    Unresolved { symbol: &'static str, reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_display() {
        let err = InterposerError::Unresolved {
            symbol: "gtk_dialog_run",
            reason: "undefined symbol: gtk_dialog_run".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "dlsym failed : gtk_dialog_run: undefined symbol: gtk_dialog_run"
        );
    }
}
