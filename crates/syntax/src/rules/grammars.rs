//! Built-in rule grammars.
//!
//! Rules are tried at every position and the earliest match wins; ties go to
//! the rule listed first. Order therefore matters: comments and strings come
//! before anything that could match inside them.

/// One highlighting rule before compilation.
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
	pub class: &'static str,
	pub pattern: &'static str,
	/// Rules applied inside this rule's match.
	pub inner: &'static [RuleDef],
}

const fn rule(class: &'static str, pattern: &'static str) -> RuleDef {
	RuleDef { class, pattern, inner: &[] }
}

const ESCAPES: &[RuleDef] = &[rule("hl-escape", r"\\[\s\S]")];

const NUMBER: RuleDef = rule(
	"hl-number",
	r"\b(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?)\b",
);

const C_COMMENT: RuleDef = rule("hl-comment", r"//[^\n]*|/\*[\s\S]*?\*/");

const TYPE_NAME: RuleDef = rule("hl-type", r"\b[A-Z][A-Za-z0-9_]*\b");

pub const RUST: &[RuleDef] = &[
	C_COMMENT,
	RuleDef {
		class: "hl-string",
		pattern: r#"b?"(?:[^"\\]|\\[\s\S])*""#,
		inner: ESCAPES,
	},
	rule("hl-string", r"b?'(?:[^'\\\n]|\\[^\n]+?)'"),
	rule("hl-attribute", r"#!?\[[^\]\n]*\]"),
	rule("hl-label", r"'[a-z_][a-z0-9_]*\b"),
	rule(
		"hl-keyword",
		r"\b(?:as|async|await|break|const|continue|crate|dyn|else|enum|extern|fn|for|if|impl|in|let|loop|match|mod|move|mut|pub|ref|return|self|Self|static|struct|super|trait|type|unsafe|use|where|while)\b",
	),
	rule("hl-constant", r"\b(?:true|false|None|Some|Ok|Err)\b"),
	rule("hl-function", r"\b[a-z_][a-z0-9_]*!"),
	NUMBER,
	TYPE_NAME,
];

const JS_STRINGS: [RuleDef; 2] = [
	RuleDef {
		class: "hl-string",
		pattern: r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'"#,
		inner: ESCAPES,
	},
	RuleDef {
		class: "hl-string",
		pattern: r"`(?:[^`\\]|\\[\s\S])*`",
		inner: &[rule("hl-escape", r"\\[\s\S]"), rule("hl-interpolation", r"\$\{[^}]*\}")],
	},
];

pub const JAVASCRIPT: &[RuleDef] = &[
	C_COMMENT,
	JS_STRINGS[0],
	JS_STRINGS[1],
	rule(
		"hl-keyword",
		r"\b(?:async|await|break|case|catch|class|const|continue|debugger|default|delete|do|else|export|extends|finally|for|from|function|if|import|in|instanceof|let|new|of|return|static|super|switch|this|throw|try|typeof|var|void|while|yield)\b",
	),
	rule("hl-constant", r"\b(?:true|false|null|undefined|NaN|Infinity)\b"),
	NUMBER,
	TYPE_NAME,
];

pub const TYPESCRIPT: &[RuleDef] = &[
	C_COMMENT,
	JS_STRINGS[0],
	JS_STRINGS[1],
	rule("hl-attribute", r"@[A-Za-z_][\w.]*"),
	rule(
		"hl-keyword",
		r"\b(?:abstract|as|async|await|break|case|catch|class|const|continue|declare|default|delete|do|else|enum|export|extends|finally|for|from|function|if|implements|import|in|instanceof|interface|keyof|let|namespace|new|of|private|protected|public|readonly|return|static|super|switch|this|throw|try|type|typeof|var|void|while|yield)\b",
	),
	rule("hl-constant", r"\b(?:true|false|null|undefined|NaN|Infinity)\b"),
	rule("hl-type", r"\b(?:string|number|boolean|any|unknown|never|object|bigint|symbol)\b"),
	NUMBER,
	TYPE_NAME,
];

pub const PYTHON: &[RuleDef] = &[
	rule("hl-comment", r"#[^\n]*"),
	RuleDef {
		class: "hl-string",
		pattern: r#"(?:[rRbBuUfF]{1,2})?(?:"""[\s\S]*?"""|'''[\s\S]*?''')"#,
		inner: ESCAPES,
	},
	RuleDef {
		class: "hl-string",
		pattern: r#"(?:[rRbBuUfF]{1,2})?(?:"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')"#,
		inner: ESCAPES,
	},
	rule("hl-attribute", r"@[A-Za-z_][\w.]*"),
	rule(
		"hl-keyword",
		r"\b(?:and|as|assert|async|await|break|class|continue|def|del|elif|else|except|finally|for|from|global|if|import|in|is|lambda|nonlocal|not|or|pass|raise|return|try|while|with|yield)\b",
	),
	rule("hl-constant", r"\b(?:True|False|None)\b"),
	rule(
		"hl-function",
		r"\b(?:print|len|range|open|int|str|float|list|dict|set|tuple|isinstance|super|enumerate|zip)\b",
	),
	NUMBER,
	TYPE_NAME,
];

pub const JSON: &[RuleDef] = &[
	RuleDef {
		class: "hl-property",
		pattern: r#""(?:[^"\\\n]|\\.)*"\s*:"#,
		inner: ESCAPES,
	},
	RuleDef {
		class: "hl-string",
		pattern: r#""(?:[^"\\\n]|\\.)*""#,
		inner: ESCAPES,
	},
	rule("hl-constant", r"\b(?:true|false|null)\b"),
	rule("hl-number", r"-?\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b"),
];

pub const BASH: &[RuleDef] = &[
	rule("hl-variable", r"\$(?:\{[^}\n]*\}|\w+|[#?@*$!0-9])"),
	rule("hl-comment", r"#[^\n]*"),
	RuleDef {
		class: "hl-string",
		pattern: r#""(?:[^"\\]|\\[\s\S])*""#,
		inner: &[
			rule("hl-escape", r"\\[\s\S]"),
			rule("hl-variable", r"\$(?:\{[^}\n]*\}|\w+)"),
		],
	},
	rule("hl-string", r"'[^']*'"),
	rule(
		"hl-keyword",
		r"\b(?:if|then|else|elif|fi|for|while|until|do|done|case|esac|in|function|return|local|export|readonly|declare|source)\b",
	),
	rule(
		"hl-function",
		r"\b(?:echo|cd|printf|read|exit|set|unset|shift|test|eval|exec|trap)\b",
	),
	rule("hl-number", r"\b\d+\b"),
];

/// Every built-in grammar by canonical language id.
pub const BUILTIN: &[(&str, &[RuleDef])] = &[
	("rust", RUST),
	("javascript", JAVASCRIPT),
	("typescript", TYPESCRIPT),
	("python", PYTHON),
	("json", JSON),
	("bash", BASH),
];
