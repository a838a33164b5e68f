use test_utils::{check_output, check_output_with_stdin, Expected};

#[test]
fn rand_sequence_is_deterministic_and_wraps() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/rand_sequence.glint"],
        Expected {
            stdout: "57\n97\n28\n7\n71\n1\n79\n83\n64\n82\n89\n24\n57\n",
            stderr: "",
            code: 0,
        },
    )
}

#[test]
fn read_prompts_then_echoes_trimmed_line() -> Result<(), Box<dyn std::error::Error>> {
    check_output_with_stdin(
        &["tests/scripts/read_input.glint"],
        "Ada\n",
        Expected {
            stdout: "input required > hello Ada\n",
            stderr: "",
            code: 0,
        },
    )
}

#[test]
fn read_returns_empty_string_on_eof() -> Result<(), Box<dyn std::error::Error>> {
    check_output_with_stdin(
        &["tests/scripts/read_input.glint"],
        "",
        Expected {
            stdout: "input required > hello \n",
            stderr: "",
            code: 0,
        },
    )
}
