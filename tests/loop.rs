use test_utils::{check_output, Expected};

#[test]
fn while_countdown() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/while_countdown.glint"],
        Expected {
            stdout: "3\n2\n1\n",
            stderr: "",
            code: 0,
        },
    )
}

#[test]
fn string_loop_iterates_each_character() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/string_loop.glint"],
        Expected {
            stdout: "abc\n",
            stderr: "",
            code: 0,
        },
    )
}
