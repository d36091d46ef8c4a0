pub mod check;
pub mod decode;
pub mod dump;
pub mod encode;
