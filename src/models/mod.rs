pub mod favorite;
pub mod notification;
pub mod plate;
pub mod session;
pub mod zone;

pub use favorite::Favorite;
pub use notification::{Notification, NotificationKind, NotificationSettings};
pub use plate::Plate;
pub use session::{Session, SessionTime, TimestampIssue};
pub use zone::{Zone, ZoneRate};
