pub mod contact;
pub mod validate;
