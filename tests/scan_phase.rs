use test_utils::{check_output, Expected};

#[test]
fn scan_phase_prints_one_token_per_line() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["scan", "tests/scripts/arithmetic.glint"],
        Expected {
            stdout: "Print print\nNumber 1\nPlus +\nNumber 2\nStar *\nNumber 3\nSemicolon ;\n",
            stderr: "",
            code: 0,
        },
    )
}

#[test]
fn scan_phase_reports_lex_errors_but_still_prints_tokens_and_exits_0() -> Result<(), Box<dyn std::error::Error>> {
    // `tests/scripts/lex_error.glint` ("1 @ 2") has a genuine lex-level
    // diagnostic (`@` is not a recognized character). Per spec.md §4.1/§6,
    // the lexer reports it but keeps scanning, and the `scan` phase always
    // prints tokens and exits 0 regardless of `had_parse_error` — unlike
    // `parse`, which maps a parse/lex diagnostic onto exit code 65.
    check_output(
        &["scan", "tests/scripts/lex_error.glint"],
        Expected {
            stdout: "Number 1\nNumber 2\n",
            stderr: "[line 1] Error: Unexpected character '@'\n",
            code: 0,
        },
    )
}
