pub mod driver;
pub mod machine;
pub mod registry;
pub mod signals;
