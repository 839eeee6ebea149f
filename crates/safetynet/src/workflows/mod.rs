pub mod account;
pub mod advisor;
pub mod tradein;
