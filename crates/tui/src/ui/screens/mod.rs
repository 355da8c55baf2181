pub mod account;
pub mod dashboard;
pub mod form;
pub mod list;
pub mod login;
