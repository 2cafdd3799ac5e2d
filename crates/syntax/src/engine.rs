use folio_primitives::BoxFutureStatic;

use crate::{HighlightError, TokenTree};

/// A syntax highlighter the editor can drive.
///
/// Highlighting is synchronous and must be cheap enough to run inside a
/// provider update. Loading a grammar may be slow and happens off the update
/// path through the returned future.
pub trait HighlightEngine: Send + Sync {
	/// Returns true when the engine has a grammar for `language` at all.
	fn supports_language(&self, language: &str) -> bool;

	/// Returns true when the grammar for `language` is ready to use.
	fn is_language_loaded(&self, language: &str) -> bool;

	/// Loads the grammar for `language`.
	fn load_language(&self, language: &str) -> BoxFutureStatic<Result<(), HighlightError>>;

	/// Highlights `text` with a loaded grammar.
	fn highlight(&self, text: &str, language: &str) -> Result<Vec<TokenTree>, HighlightError>;
}
