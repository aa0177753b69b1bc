//! Name → app lookup shared by all requests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::app::{App, StaticApp};
use crate::config::AppConfig;

/// Immutable registry of the gateway's applications.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    apps: HashMap<String, Arc<dyn App>>,
}

impl AppRegistry {
    /// Build a `StaticApp` for every configured app.
    pub fn from_config(apps: &BTreeMap<String, AppConfig>) -> Self {
        apps.iter()
            .map(|(name, config)| {
                let app: Arc<dyn App> = Arc::new(StaticApp::from_config(name, config));
                (name.clone(), app)
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn App>> {
        self.apps.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl FromIterator<(String, Arc<dyn App>)> for AppRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Arc<dyn App>)>>(iter: I) -> Self {
        Self {
            apps: iter.into_iter().collect(),
        }
    }
}
