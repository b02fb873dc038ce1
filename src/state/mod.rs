//! Name request session state

mod codes;
mod lookup;
mod modal;
mod records;
mod request_state;
mod tracked;
mod wizard;

pub use codes::*;
pub use lookup::*;
pub use modal::*;
pub use records::*;
pub use request_state::*;
pub use tracked::*;
pub use wizard::*;
