pub mod kubernetes;
pub mod pod;
