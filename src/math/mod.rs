pub mod tick_shift;
