pub mod catalog;
pub mod health;
pub mod moderation;
pub mod projects;
