mod common;
mod health;
mod plant;
mod suggest;
