pub mod reports;
pub mod text;
