use crate::token::Token;

/// Expression nodes produced by the parser.
///
/// `Variable`, `Assign`, and `This` carry a dense `usize` id assigned at parse
/// time.  The resolver keys its binding-distance side-table on that id, which
/// gives two syntactically identical expressions at different source positions
/// distinct entries.
#[derive(Debug)]
pub enum Expr {
    // Used to parse assignments to a previously declared name
    Assign(usize, Token, Box<Expr>),

    // Used to parse Binary expressions
    Binary(Box<Expr>, Token, Box<Expr>),

    // Used to parse call expressions; the Token is the closing ')'
    Call(Box<Expr>, Token, Vec<Expr>),

    // Used to parse property reads
    Get(Box<Expr>, Token),

    // Used to parse parenthesized grouped expressions
    Grouping(Box<Expr>),

    // Used to parse Literal expressions
    Literal(Token),

    // Used to parse short-circuiting 'and' / 'or'
    Logical(Box<Expr>, Token, Box<Expr>),

    // Used to parse property writes
    Set(Box<Expr>, Token, Box<Expr>),

    // Used to parse the 'this' keyword inside methods
    This(usize, Token),

    // Used to parse Unary expressions
    Unary(Token, Box<Expr>),

    // Used to parse variable references
    Variable(usize, Token),
}
