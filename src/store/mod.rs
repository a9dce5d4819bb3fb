pub mod bundle;
pub mod marks;
pub mod owners;
pub mod session;
