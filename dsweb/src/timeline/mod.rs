//! Message timeline: formatting, rendering and the surfaces it draws on.

mod format;
mod renderer;
mod surface;
mod terminal;

pub use renderer::MessageRenderer;
pub use surface::{share, SharedSurface};
pub use terminal::TerminalSurface;

#[cfg(test)]
pub use format::FixedClock;
#[cfg(test)]
pub use surface::{MemorySurface, UiSurface};
