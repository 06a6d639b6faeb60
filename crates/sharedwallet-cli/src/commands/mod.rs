pub mod demo;
pub mod identity;
pub mod run;
