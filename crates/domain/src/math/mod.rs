mod constant_product;

pub use constant_product::*;
