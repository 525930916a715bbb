use reporting_application::{NavigationRoute, Navigator};
use tracing::info;

/// Navigator for headless shells that records route changes in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn go_to(&self, route: &NavigationRoute) {
        info!(route = %route, "navigating");
    }
}
