//! Default style ids
//!
//! Language definitions map their own styles onto a shared vocabulary of
//! `def:*` ids. Themes only need to know these; everything else reaches
//! them through `map-to` chains.

use super::style::{Color, TextStyle};

/// The shared `def:*` style vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultStyle {
    Comment,
    Shebang,
    DocComment,
    DocCommentElement,
    Constant,
    Character,
    String,
    SpecialChar,
    Number,
    FloatingPoint,
    Decimal,
    BaseNInteger,
    Boolean,
    SpecialConstant,
    Identifier,
    Function,
    Builtin,
    Variable,
    Statement,
    Keyword,
    Operator,
    Type,
    Preprocessor,
    Error,
    Note,
    Underlined,
    NetAddress,
}

impl DefaultStyle {
    /// Every default style
    pub const ALL: [DefaultStyle; 27] = [
        DefaultStyle::Comment,
        DefaultStyle::Shebang,
        DefaultStyle::DocComment,
        DefaultStyle::DocCommentElement,
        DefaultStyle::Constant,
        DefaultStyle::Character,
        DefaultStyle::String,
        DefaultStyle::SpecialChar,
        DefaultStyle::Number,
        DefaultStyle::FloatingPoint,
        DefaultStyle::Decimal,
        DefaultStyle::BaseNInteger,
        DefaultStyle::Boolean,
        DefaultStyle::SpecialConstant,
        DefaultStyle::Identifier,
        DefaultStyle::Function,
        DefaultStyle::Builtin,
        DefaultStyle::Variable,
        DefaultStyle::Statement,
        DefaultStyle::Keyword,
        DefaultStyle::Operator,
        DefaultStyle::Type,
        DefaultStyle::Preprocessor,
        DefaultStyle::Error,
        DefaultStyle::Note,
        DefaultStyle::Underlined,
        DefaultStyle::NetAddress,
    ];

    /// Qualified style id, e.g. `def:comment`
    pub fn id(&self) -> &'static str {
        match self {
            DefaultStyle::Comment => "def:comment",
            DefaultStyle::Shebang => "def:shebang",
            DefaultStyle::DocComment => "def:doc-comment",
            DefaultStyle::DocCommentElement => "def:doc-comment-element",
            DefaultStyle::Constant => "def:constant",
            DefaultStyle::Character => "def:character",
            DefaultStyle::String => "def:string",
            DefaultStyle::SpecialChar => "def:special-char",
            DefaultStyle::Number => "def:number",
            DefaultStyle::FloatingPoint => "def:floating-point",
            DefaultStyle::Decimal => "def:decimal",
            DefaultStyle::BaseNInteger => "def:base-n-integer",
            DefaultStyle::Boolean => "def:boolean",
            DefaultStyle::SpecialConstant => "def:special-constant",
            DefaultStyle::Identifier => "def:identifier",
            DefaultStyle::Function => "def:function",
            DefaultStyle::Builtin => "def:builtin",
            DefaultStyle::Variable => "def:variable",
            DefaultStyle::Statement => "def:statement",
            DefaultStyle::Keyword => "def:keyword",
            DefaultStyle::Operator => "def:operator",
            DefaultStyle::Type => "def:type",
            DefaultStyle::Preprocessor => "def:preprocessor",
            DefaultStyle::Error => "def:error",
            DefaultStyle::Note => "def:note",
            DefaultStyle::Underlined => "def:underlined",
            DefaultStyle::NetAddress => "def:net-address",
        }
    }

    /// Parse a qualified style id
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|style| style.id() == id)
    }

    /// Get the default rendering of this style
    pub fn default_style(&self) -> TextStyle {
        match self {
            DefaultStyle::Comment => TextStyle::fg(Color::BrightBlack).with_italic(),
            DefaultStyle::Shebang => TextStyle::fg(Color::BrightBlack).with_bold(),
            DefaultStyle::DocComment => TextStyle::fg(Color::Blue).with_italic(),
            DefaultStyle::DocCommentElement => TextStyle::fg(Color::Blue).with_bold(),
            DefaultStyle::Constant => TextStyle::fg(Color::BrightRed),
            DefaultStyle::Character => TextStyle::fg(Color::Green),
            DefaultStyle::String => TextStyle::fg(Color::Green),
            DefaultStyle::SpecialChar => TextStyle::fg(Color::BrightYellow),
            DefaultStyle::Number
            | DefaultStyle::FloatingPoint
            | DefaultStyle::Decimal
            | DefaultStyle::BaseNInteger => TextStyle::fg(Color::Cyan),
            DefaultStyle::Boolean => TextStyle::fg(Color::BrightRed).with_bold(),
            DefaultStyle::SpecialConstant => TextStyle::fg(Color::BrightRed),
            DefaultStyle::Identifier => TextStyle::default(),
            DefaultStyle::Function => TextStyle::fg(Color::Blue),
            DefaultStyle::Builtin => TextStyle::fg(Color::BrightCyan),
            DefaultStyle::Variable => TextStyle::fg(Color::BrightBlue),
            DefaultStyle::Statement => TextStyle::fg(Color::Magenta).with_bold(),
            DefaultStyle::Keyword => TextStyle::fg(Color::Magenta).with_bold(),
            DefaultStyle::Operator => TextStyle::fg(Color::BrightWhite),
            DefaultStyle::Type => TextStyle::fg(Color::Yellow),
            DefaultStyle::Preprocessor => TextStyle::fg(Color::BrightMagenta),
            DefaultStyle::Error => TextStyle::fg(Color::White).with_bg(Color::Red),
            DefaultStyle::Note => TextStyle::fg(Color::Black).with_bg(Color::Yellow),
            DefaultStyle::Underlined => TextStyle::default().with_underline(),
            DefaultStyle::NetAddress => TextStyle::fg(Color::Blue).with_underline(),
        }
    }

    /// Get a human-readable name for this style
    pub fn name(&self) -> &'static str {
        match self {
            DefaultStyle::Comment => "Comment",
            DefaultStyle::Shebang => "Shebang",
            DefaultStyle::DocComment => "Documentation comment",
            DefaultStyle::DocCommentElement => "Documentation comment element",
            DefaultStyle::Constant => "Constant",
            DefaultStyle::Character => "Character",
            DefaultStyle::String => "String",
            DefaultStyle::SpecialChar => "Special character",
            DefaultStyle::Number => "Number",
            DefaultStyle::FloatingPoint => "Floating point number",
            DefaultStyle::Decimal => "Decimal number",
            DefaultStyle::BaseNInteger => "Base-N integer",
            DefaultStyle::Boolean => "Boolean value",
            DefaultStyle::SpecialConstant => "Special constant",
            DefaultStyle::Identifier => "Identifier",
            DefaultStyle::Function => "Function",
            DefaultStyle::Builtin => "Builtin",
            DefaultStyle::Variable => "Variable",
            DefaultStyle::Statement => "Statement",
            DefaultStyle::Keyword => "Keyword",
            DefaultStyle::Operator => "Operator",
            DefaultStyle::Type => "Data type",
            DefaultStyle::Preprocessor => "Preprocessor",
            DefaultStyle::Error => "Error",
            DefaultStyle::Note => "Note",
            DefaultStyle::Underlined => "Underlined",
            DefaultStyle::NetAddress => "Network address",
        }
    }
}
