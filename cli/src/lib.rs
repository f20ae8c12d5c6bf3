pub mod io;
pub mod logging;
