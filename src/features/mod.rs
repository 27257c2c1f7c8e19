pub mod auth;
pub mod complaints;
pub mod drafts;
pub mod pages;
