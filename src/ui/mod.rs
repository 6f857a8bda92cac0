pub mod dialogs;
pub mod terminal_guard;
mod wizard_view;
mod workflow_view;

pub use dialogs::{centered_rect, AlertDialog};
pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use wizard_view::render_wizard;
pub use workflow_view::WorkflowPanel;
