pub mod rain;
pub mod sprites;
