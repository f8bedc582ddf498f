pub mod db;
pub mod models;
pub mod users;
pub mod reports;

pub use db::{Database, IndexStats};
pub use models::{GoogleAccount, NewReport, Report, User, UserUpdate};
