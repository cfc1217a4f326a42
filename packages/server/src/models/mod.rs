pub mod health;
pub mod plant;
pub mod suggest;
pub mod upload;
