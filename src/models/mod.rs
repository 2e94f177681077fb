pub mod movie;
pub mod poster;
pub mod user;
