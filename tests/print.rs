use test_utils::{check_output, Expected};

#[test]
fn arithmetic_precedence() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/arithmetic.glint"],
        Expected {
            stdout: "7\n",
            stderr: "",
            code: 0,
        },
    )
}

#[test]
fn string_number_concatenation() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/string_concat.glint"],
        Expected {
            stdout: "Sum: 15\n",
            stderr: "",
            code: 0,
        },
    )
}

#[test]
fn builtins_floor_and_substring() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/builtins.glint"],
        Expected {
            stdout: "3\nhello\n",
            stderr: "",
            code: 0,
        },
    )
}
