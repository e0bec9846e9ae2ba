mod command_overlay;
mod debounce;
mod input;
mod key_result;
mod search_input;
mod toast;

pub use command_overlay::draw_command_overlay;
pub use debounce::Debouncer;
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
pub use toast::{Toast, ToastState};
