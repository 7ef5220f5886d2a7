pub mod validator;
pub mod yield_source;
