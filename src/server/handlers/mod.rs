pub mod form;
pub mod health;
pub mod query;
