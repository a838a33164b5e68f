use test_utils::{check_output, Expected};

#[test]
fn counter_closure_increments_across_calls() -> Result<(), Box<dyn std::error::Error>> {
    check_output(
        &["tests/scripts/closures.glint"],
        Expected {
            stdout: "1\n2\n3\n",
            stderr: "",
            code: 0,
        },
    )
}
