pub mod blocking;
pub mod booking;
pub mod car;
pub mod event;
pub mod ledger;
pub mod notify;
pub mod period;
pub mod reminder;
pub mod settings;
pub mod summary;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use blocking::Blocking;
pub use booking::Booking;
pub use car::Car;
pub use event::Events;
pub use ledger::Ledger;
pub use reminder::Reminder;
pub use settings::Settings;
pub use summary::Summary;
pub use user::User;
