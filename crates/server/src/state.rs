//! Shared application state

use std::sync::Arc;

use faq_dialog_engine::DialogController;

use crate::settings::Settings;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DialogController>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(controller: Arc<DialogController>, settings: Settings) -> Self {
        Self {
            controller,
            settings: Arc::new(settings),
        }
    }
}
