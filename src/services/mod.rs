pub mod config_store;
pub mod notification;
pub mod remote_state;

pub use config_store::ConfigStore;
pub use notification::{Notification, NotificationSink};
pub use remote_state::RemoteStateService;
