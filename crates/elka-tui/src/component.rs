//! The trait every page implements.

use color_eyre::eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::{Action, Completion};

/// A routed page.
///
/// Lifecycle: `init` once when the page is shown, then any mix of the
/// event hooks and `render` until the app navigates away and drops it.
pub trait Component: Send {
    /// Receives the action sender. Pages that load data send their first
    /// [`Request`](crate::action::Request) from here.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    fn handle_mouse_event(&mut self, _mouse: MouseEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Text pasted into the terminal.
    fn handle_paste(&mut self, _text: &str) -> Result<Option<Action>> {
        Ok(None)
    }

    /// App-wide actions the page may react to (ticks, resizes).
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// The answer to a request this page made.
    fn complete(&mut self, _completion: Completion) -> Result<Option<Action>> {
        Ok(None)
    }

    /// While true, plain letter keys go to the page instead of the
    /// global bindings.
    fn captures_input(&self) -> bool {
        false
    }

    fn render(&self, frame: &mut Frame, area: Rect);

    /// Short name for logs.
    fn id(&self) -> &str;
}
