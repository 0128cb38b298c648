pub mod categories;
pub mod groups;
pub mod health;
pub mod items;
pub mod lists;
pub mod tokens;
pub mod users;
