//! Screens, user actions and the builder's step list.

use std::fmt;

/// The screen the wizard is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Screen {
    #[default]
    Options,
    Guidance,
    DatabaseSelect,
    Builder,
    Generated,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Screen::Options => "options",
            Screen::Guidance => "guidance",
            Screen::DatabaseSelect => "database",
            Screen::Builder => "builder",
            Screen::Generated => "generated",
        })
    }
}

/// Choice made on the first screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryOption {
    /// Build a new query.
    New,
    /// Read the user guide.
    Guidance,
}

/// Something the user asked the wizard to do.
///
/// Carried by [`super::WizardError::InvalidTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SelectOption(EntryOption),
    SelectDatabase,
    Back,
    EditForm,
    Generate,
    BackToOptions,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SelectOption(EntryOption::New) => f.write_str("start a new query"),
            Action::SelectOption(EntryOption::Guidance) => f.write_str("open the guide"),
            Action::SelectDatabase => f.write_str("select a database"),
            Action::Back => f.write_str("go back"),
            Action::EditForm => f.write_str("edit the form"),
            Action::Generate => f.write_str("generate a query"),
            Action::BackToOptions => f.write_str("return to the start"),
        }
    }
}

/// A tab in the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderStep {
    Fields,
    Aggregation,
    Cumulative,
    ComplexData,
    DateTime,
    CustomSql,
}

impl BuilderStep {
    pub const ALL: [BuilderStep; 6] = [
        BuilderStep::Fields,
        BuilderStep::Aggregation,
        BuilderStep::Cumulative,
        BuilderStep::ComplexData,
        BuilderStep::DateTime,
        BuilderStep::CustomSql,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            BuilderStep::Fields => "fields",
            BuilderStep::Aggregation => "aggregation",
            BuilderStep::Cumulative => "cumulative",
            BuilderStep::ComplexData => "complex-data",
            BuilderStep::DateTime => "date-time",
            BuilderStep::CustomSql => "custom-sql",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuilderStep::Fields => "Fields",
            BuilderStep::Aggregation => "Aggregation",
            BuilderStep::Cumulative => "Cumulative",
            BuilderStep::ComplexData => "Complex Data",
            BuilderStep::DateTime => "Date/Time",
            BuilderStep::CustomSql => "Custom SQL",
        }
    }

    /// Not yet available in the builder.
    pub fn is_disabled(&self) -> bool {
        matches!(self, BuilderStep::ComplexData | BuilderStep::DateTime)
    }
}

/// One entry in the builder sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStatus {
    pub step: BuilderStep,
    /// 1-based position.
    pub number: usize,
    pub completed: bool,
    pub disabled: bool,
}
