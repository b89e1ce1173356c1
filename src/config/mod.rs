//! Configuration module for Job Creator.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, AuthSettings, CompilerSettings, DelaySettings, ServerSettings, Settings,
    SettingsError, WizardSettings,
};
