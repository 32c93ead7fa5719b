//! Screen implementations. Each screen is a top-level Component.

pub mod dashboard;
pub mod map;
pub mod settings;

use binwatch_core::MonitorConfig;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar.
pub fn create_screens(config: &MonitorConfig) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new()),
        ),
        (ScreenId::Map, Box::new(map::MapScreen::new())),
        (
            ScreenId::Settings,
            Box::new(settings::SettingsScreen::new(config)),
        ),
    ]
}
