//! One store per backend resource. Every store owns a [`crate::store::Store`]
//! slice and reads the session through a [`auth::SessionReader`].

pub mod articles;
pub mod auth;
pub mod campaigns;
pub mod comments;
pub mod donations;
pub mod leaderboard;
pub mod points;
pub mod profile;
pub mod rewards;
pub mod transfers;
pub mod updates;
