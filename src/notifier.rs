use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::AppResult;
use crate::services::{Notification, NotificationSink};

const APP_TITLE: &str = "Changelog Notifier";
const TEST_MESSAGE: &str = "Notification test successful! The app is working correctly.";

/// Front for the selected [`NotificationSink`] that carries the user's sound
/// preference.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    sound_enabled: AtomicBool,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, sound_enabled: bool) -> Self {
        Self {
            sink,
            sound_enabled: AtomicBool::new(sound_enabled),
        }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    pub async fn show_release(&self, title: String, body: String, url: String) -> AppResult<()> {
        let notification = Notification::new(title, body)
            .with_sound(self.sound_enabled())
            .with_action(url);
        debug!(
            sink = self.sink.name(),
            title = %notification.title,
            "showing release notification"
        );
        self.sink.show(&notification).await
    }

    /// Errors are always silent.
    pub async fn show_error(&self, message: &str) -> AppResult<()> {
        let notification = Notification::new(format!("{APP_TITLE} Error"), message);
        self.sink.show(&notification).await
    }

    pub async fn show_test(&self) -> AppResult<()> {
        let notification =
            Notification::new(APP_TITLE, TEST_MESSAGE).with_sound(self.sound_enabled());
        self.sink.show(&notification).await
    }
}
