pub mod gigs;
pub mod messages;
pub mod orders;
pub mod users;
