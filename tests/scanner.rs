use rox as lox;

use lox::scanner::Scanner;
use lox::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source.as_bytes().to_vec());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn it_scans_punctuation() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn it_scans_one_and_two_char_operators() {
    assert_token_sequence(
        "! != = == < <= > >= / - ;",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::SLASH, "/"),
            (TokenType::MINUS, "-"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn it_distinguishes_keywords_from_identifiers() {
    assert_token_sequence(
        "var varnish fun function class classy",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "varnish"),
            (TokenType::FUN, "fun"),
            (TokenType::IDENTIFIER, "function"),
            (TokenType::CLASS, "class"),
            (TokenType::IDENTIFIER, "classy"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn it_scans_all_keywords() {
    assert_token_sequence(
        "and class else false fun for if nil or print return super this true var while",
        &[
            (TokenType::AND, "and"),
            (TokenType::CLASS, "class"),
            (TokenType::ELSE, "else"),
            (TokenType::FALSE, "false"),
            (TokenType::FUN, "fun"),
            (TokenType::FOR, "for"),
            (TokenType::IF, "if"),
            (TokenType::NIL, "nil"),
            (TokenType::OR, "or"),
            (TokenType::PRINT, "print"),
            (TokenType::RETURN, "return"),
            (TokenType::SUPER, "super"),
            (TokenType::THIS, "this"),
            (TokenType::TRUE, "true"),
            (TokenType::VAR, "var"),
            (TokenType::WHILE, "while"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn it_decodes_string_literals() {
    let scanner = Scanner::new(b"\"hello lox\"".to_vec());
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(2, tokens.len());
    assert_eq!("\"hello lox\"", tokens[0].lexeme);

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!("hello lox", s),
        other => panic!("expected string token, got {:?}", other),
    }
}

#[test]
fn it_scans_integer_and_fractional_numbers() {
    let scanner = Scanner::new(b"42 3.14".to_vec());
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(3, tokens.len());

    match tokens[0].token_type {
        TokenType::NUMBER(n) => assert_eq!(42.0, n),
        ref other => panic!("expected number token, got {:?}", other),
    }

    match tokens[1].token_type {
        TokenType::NUMBER(n) => assert_eq!(3.14, n),
        ref other => panic!("expected number token, got {:?}", other),
    }
}

#[test]
fn a_trailing_dot_is_not_part_of_a_number() {
    assert_token_sequence(
        "123.",
        &[
            (TokenType::NUMBER(123.0), "123"),
            (TokenType::DOT, "."),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn it_skips_line_comments() {
    assert_token_sequence(
        "1 // the rest of this line disappears\n2",
        &[
            (TokenType::NUMBER(1.0), "1"),
            (TokenType::NUMBER(2.0), "2"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn it_tracks_line_numbers() {
    let scanner = Scanner::new(b"1\n2\n\n3".to_vec());
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(1, tokens[0].line);
    assert_eq!(2, tokens[1].line);
    assert_eq!(4, tokens[2].line);
}

#[test]
fn multi_line_strings_advance_the_line_counter() {
    let scanner = Scanner::new(b"\"one\ntwo\"\nafter".to_vec());
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!("one\ntwo", s),
        other => panic!("expected string token, got {:?}", other),
    }

    // The identifier after the string sits on line 3.
    assert_eq!(TokenType::IDENTIFIER, tokens[1].token_type);
    assert_eq!(3, tokens[1].line);
}

#[test]
fn it_reports_unexpected_characters_and_continues() {
    let scanner = Scanner::new(b",.$(#".to_vec());
    let results: Vec<_> = scanner.collect();

    // ',' '.' err '(' err EOF
    assert_eq!(6, results.len());

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(2, error_count);

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "unexpected message: {}",
            err
        );
    }

    let tokens: Vec<&Token> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(TokenType::COMMA, tokens[0].token_type);
    assert_eq!(TokenType::DOT, tokens[1].token_type);
    assert_eq!(TokenType::LEFT_PAREN, tokens[2].token_type);
    assert_eq!(TokenType::EOF, tokens[3].token_type);
}

#[test]
fn it_reports_unterminated_strings() {
    let scanner = Scanner::new(b"\"no closing quote".to_vec());
    let results: Vec<_> = scanner.collect();

    let err = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("expected a lexical error");

    assert!(err.to_string().contains("Unterminated string."));
}

#[test]
fn identifiers_may_contain_underscores_and_digits() {
    assert_token_sequence(
        "_private snake_case v2",
        &[
            (TokenType::IDENTIFIER, "_private"),
            (TokenType::IDENTIFIER, "snake_case"),
            (TokenType::IDENTIFIER, "v2"),
            (TokenType::EOF, ""),
        ],
    );
}
