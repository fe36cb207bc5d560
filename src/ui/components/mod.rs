mod command_input;
mod confirm;
mod filter_picker;
mod input;
mod prompt;
mod record_form;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{ConfirmDialog, ConfirmEvent};
pub use filter_picker::{FilterPicker, FilterPickerEvent};
pub use prompt::{Prompt, PromptEvent};
pub use record_form::{FormEvent, FormMode, RecordForm};
pub use search_input::{SearchEvent, SearchInput};

/// Outcome of offering a key to a component.
///
/// Components are tried in order by their parent view; the first one that
/// doesn't answer `NotHandled` owns the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
