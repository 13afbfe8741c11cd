pub mod cart;
pub mod order;
pub mod otp;
pub mod product;
pub mod review;
pub mod user;

pub use cart::*;
pub use order::*;
pub use otp::*;
pub use product::*;
pub use review::*;
pub use user::*;
