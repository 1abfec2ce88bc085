mod divide;
mod echo;
mod ping;
mod square;
mod tally;

pub use divide::{DIVISION_BY_ZERO, Divide};
pub use echo::Echo;
pub use ping::Ping;
pub use square::Square;
pub use tally::Tally;
