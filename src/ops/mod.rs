pub mod apply;
pub mod board_ops;
pub mod calendar_ops;
pub mod card_ops;
pub mod check;

pub use board_ops::BoardError;
