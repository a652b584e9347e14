//! Navigation hook used when the session ends

/// Moves the user to another location, e.g. the login page
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, location: &str) {
        self(location);
    }
}

/// Navigator that only records the redirect in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        tracing::info!(%location, "navigation requested");
    }
}
