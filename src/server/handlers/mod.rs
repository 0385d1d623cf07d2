pub mod ask;
pub mod health;
pub mod notes;
