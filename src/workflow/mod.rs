pub mod check;
pub mod detect;
