use std::fmt::{Display, Formatter};

use reporting_domain::ReportDefinitionId;

/// Shell location the controller asks to show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRoute {
    /// Report definition list.
    ReportList,
    /// Edit form of one definition.
    EditReportDefinition(ReportDefinitionId),
}

impl NavigationRoute {
    /// Returns the hash route understood by the shell.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::ReportList => "#/".to_owned(),
            Self::EditReportDefinition(id) => format!("#/edit/{id}"),
        }
    }
}

impl Display for NavigationRoute {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.path().as_str())
    }
}

/// Port for shell navigation side effects.
pub trait Navigator: Send + Sync {
    /// Moves the shell to a route.
    fn go_to(&self, route: &NavigationRoute);
}

/// Events the shell reacts to after controller actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDefinitionEvent {
    /// Definition was deleted on the backend.
    Deleted(ReportDefinitionId),
    /// User asked to edit the definition.
    EditRequested(ReportDefinitionId),
}

impl ReportDefinitionEvent {
    /// Returns the route the shell should show for this event.
    #[must_use]
    pub fn route(&self) -> NavigationRoute {
        match self {
            Self::Deleted(_) => NavigationRoute::ReportList,
            Self::EditRequested(id) => NavigationRoute::EditReportDefinition(id.clone()),
        }
    }
}
