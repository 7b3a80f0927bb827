use std::sync::Arc;

use crate::changelog::FormatLimits;
use crate::notifier::Notifier;
use crate::services::{ConfigStore, RemoteStateService};
use crate::workflow::detect::FirstRunPolicy;

#[derive(Clone)]
pub struct AppContext {
    pub remote: Arc<dyn RemoteStateService>,
    pub store: Arc<dyn ConfigStore>,
    pub notifier: Arc<Notifier>,
    pub limits: FormatLimits,
    pub first_run: FirstRunPolicy,
}

impl AppContext {
    pub fn new(
        remote: Arc<dyn RemoteStateService>,
        store: Arc<dyn ConfigStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            remote,
            store,
            notifier,
            limits: FormatLimits::default(),
            first_run: FirstRunPolicy::default(),
        }
    }

    pub fn with_first_run(mut self, first_run: FirstRunPolicy) -> Self {
        self.first_run = first_run;
        self
    }
}
