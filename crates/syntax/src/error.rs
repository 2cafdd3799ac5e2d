use thiserror::Error;

/// Errors raised while loading grammars or highlighting text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
	/// The engine has no grammar for this language.
	#[error("no grammar for language `{0}`")]
	UnknownLanguage(String),
	/// The grammar exists but has not been loaded yet.
	#[error("grammar for `{0}` is not loaded")]
	NotLoaded(String),
	/// A grammar pattern failed to compile.
	#[error("invalid pattern in `{language}` grammar: {message}")]
	Pattern {
		/// Language whose grammar is broken.
		language: String,
		/// Regex compiler message.
		message: String,
	},
	/// Any other engine failure.
	#[error("highlighter failed: {0}")]
	Engine(String),
}
