pub mod generator;
pub mod judger;
pub mod jwt;
