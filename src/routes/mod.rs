pub mod movies;
pub mod posters;
pub mod users;
