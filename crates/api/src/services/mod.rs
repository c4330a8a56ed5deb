pub mod accounts;
pub mod enrollment;
pub mod roster;

pub use accounts::AccountService;
pub use enrollment::EnrollmentManager;
