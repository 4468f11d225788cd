pub mod booking;
pub mod car;
pub mod commission_event;
pub mod commission_settings;
pub mod commission_state;
pub mod user;

pub use booking::BookingStatus;
pub use commission_event::{EventType, ReminderChannel};
pub use user::UserRole;
