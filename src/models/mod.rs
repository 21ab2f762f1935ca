//! Row types and request payloads for users, events, and attendance.

mod attendee;
mod event;
mod user;

pub use attendee::Attendee;
pub use event::{Category, Event, EventWithAttendees, NewEvent, UpdateEvent};
pub use user::{NewUser, User, UserSummary};
