pub mod events;
pub mod users;

pub use events::CreateEventData;
pub use users::CreateUserData;
