pub mod po;
pub mod rows;
