use crate::expr::Expr;
use crate::token::TokenType;

/// Converts an expression to a parenthesized prefix form, e.g.
/// `(+ 1 (* 2 3))` for `1 + 2 * 3`.  Used by the parser tests to assert on
/// tree shape without spelling out nested node constructors.
pub struct Ast;

impl Ast {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.0}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.to_string(),

                TokenType::TRUE => "true".to_string(),

                TokenType::FALSE => "false".to_string(),

                TokenType::NIL => "nil".to_string(),

                _ => unreachable!("Invalid literal"),
            },

            Expr::Grouping(expr) => format!("(group {})", self.print(expr)),

            Expr::Unary(op, expr) => format!("({} {})", op.lexeme, self.print(expr)),

            Expr::Binary(left, op, right) | Expr::Logical(left, op, right) => format!(
                "({} {} {})",
                op.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Variable(_, token) => token.lexeme.to_string(),

            Expr::This(_, _) => "this".to_string(),

            Expr::Assign(_, name, value) => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Get(object, name) => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set(object, name, value) => format!(
                "(.= {} {} {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::Call(callee, _, arguments) => {
                let mut s = format!("(call {}", self.print(callee));

                for arg in arguments {
                    s.push(' ');
                    s.push_str(&self.print(arg));
                }

                s.push(')');
                s
            }
        }
    }
}
