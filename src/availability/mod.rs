pub mod editor;
pub mod grid;
pub mod hours;
pub mod step;
pub mod week;
pub mod window;
