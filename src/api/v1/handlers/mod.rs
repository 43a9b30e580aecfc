pub mod health;
pub mod secrets;
