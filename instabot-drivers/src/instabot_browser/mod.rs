pub mod driver;
pub mod idle;
pub mod page;
pub mod session;
